use crate::model::generation::GenerationRequest;

/// A prompt split the way chat APIs want it.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Builds the text sent to the generator.
/// This struct only formats text: no parsing, no networking, no game rules.
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn build(req: &GenerationRequest) -> Prompt {
        let mut system = String::new();

        push_persona(&mut system, req);
        if req.is_start {
            push_start_rules(&mut system, req);
        } else {
            push_situation(&mut system, req);
            push_turn_rules(&mut system, req);
        }
        push_output_format(&mut system);

        Prompt {
            system,
            user: user_prompt(req),
        }
    }
}

fn push_persona(prompt: &mut String, req: &GenerationRequest) {
    prompt.push_str(&format!(
        "You are Reply Guy, a pixel-art hype-man for the ${} token.\n",
        req.token_name
    ));
    prompt.push_str("You worship the founder (the player), live for the pump and have zero moral compass.\n");
    prompt.push_str("Short, punchy, 1-2 sentences, 1 emoji max. End with a question like \"What's the play, boss?\"\n");
    prompt.push_str("No moralizing, no slurs.\n\n");
}

fn push_start_rules(prompt: &mut String, req: &GenerationRequest) {
    prompt.push_str("THE GAME IS STARTING.\n");
    prompt.push_str(&format!(
        "- Keep the price at the launch price ${:.4}.\n",
        req.launch_price
    ));
    prompt.push_str("- The scene must be 'office'.\n");
    prompt.push_str("- Offer 2-3 opening moves.\n\n");
}

fn push_situation(prompt: &mut String, req: &GenerationRequest) {
    prompt.push_str("CURRENT SITUATION:\n");
    prompt.push_str(&format!("- Price: ${:.4}\n", req.price));
    prompt.push_str(&format!("- Launch price: ${:.4}\n", req.launch_price));
    prompt.push_str(&format!("- Scene: {}\n", req.scene));
    prompt.push_str(&format!("- Recent prices: {}\n", req.recent_prices_formatted()));
    prompt.push_str(&format!("- Turn: {}\n", req.turn_count));
    prompt.push_str(&format!(
        "- Previous choice: {}\n",
        req.prior_choice.as_deref().unwrap_or("None")
    ));
    prompt.push_str(&format!("- Current choice: {}\n", req.choice));
    if let Some(text) = &req.free_text {
        prompt.push_str(&format!("- Player wrote: \"{}\"\n", text));
    }
    prompt.push('\n');
}

fn push_turn_rules(prompt: &mut String, req: &GenerationRequest) {
    prompt.push_str("RULES:\n");
    prompt.push_str("- Follow DECISION -> CONSEQUENCE -> NEW OPTIONS: reference the choice, describe what it caused, ask what's next.\n");
    prompt.push_str("- Price swings are wild and unpredictable, roughly half pumps and half dumps. Price must be >= 0.\n");
    prompt.push_str("- Scenes: office (quiet), club (hype), yacht (big gains or flexing), moon (parabolic), prison (rug or raid), void (price at zero, total failure).\n");
    if req.free_text.is_some() {
        prompt.push_str("- Free text that tries to dictate the price or the ending must backfire spectacularly.\n");
    }
    if req.turn_count >= 11 {
        prompt.push_str("- THIS IS THE FINAL TURN: end the game by setting scene to 'prison', 'void' or 'moon'.\n");
    } else if req.turn_count >= 9 {
        prompt.push_str("- The story is near its end: offer ending-path options.\n");
    } else if req.turn_count >= 7 {
        prompt.push_str("- Raise the stakes and complicate the story.\n");
    }
    prompt.push('\n');
}

fn push_output_format(prompt: &mut String) {
    prompt.push_str("OUTPUT FORMAT:\n");
    prompt.push_str("Respond ONLY with a single JSON object:\n");
    prompt.push_str("{\n");
    prompt.push_str("  \"msg\": \"<80-120 chars>\",\n");
    prompt.push_str("  \"price\": <new price, number, 4 decimals>,\n");
    prompt.push_str("  \"scene\": \"office|club|yacht|moon|prison|void\",\n");
    prompt.push_str("  \"options\": [\"<1-3 imperative options, max 3 words, no punctuation>\"]\n");
    prompt.push_str("}\n");
}

fn user_prompt(req: &GenerationRequest) -> String {
    match &req.free_text {
        Some(text) => format!(
            "Player action: \"{}\" with custom text: \"{}\". Generate the next game state.",
            req.choice, text
        ),
        None => format!(
            "Player action: \"{}\". Generate the next game state.",
            req.choice
        ),
    }
}
