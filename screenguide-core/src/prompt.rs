use crate::text::filter_transcription_output;
use crate::types::{AdvisorMode, PriorContext, UiTree};
use serde_json::{Value, json};

/// Upper bound on next-step advice length that the model is asked to respect.
pub const ADVICE_CHAR_HINT: usize = 25;

pub const DEFAULT_COMPLETION_MESSAGE: &str = "Congratulations, you have completed the task.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisorPrompt {
    pub system_instruction: String,
    pub user_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOptions<'a> {
    pub language: &'a str,
    pub system_instruction: Option<&'a str>,
    pub completion_message: &'a str,
}

impl Default for PromptOptions<'_> {
    fn default() -> Self {
        Self {
            language: "zh-TW",
            system_instruction: None,
            completion_message: DEFAULT_COMPLETION_MESSAGE,
        }
    }
}

fn default_system_instruction(mode: AdvisorMode) -> &'static str {
    match mode {
        AdvisorMode::Image => {
            "You are an expert in operating Android smartphones. You are given a screenshot of the phone and a question from its user."
        }
        AdvisorMode::UiTree => {
            "You are an expert in operating Android smartphones. You are given the Android UI structure of the current screen and a question from its user."
        }
    }
}

// The framing below decides what `mission_achieved` means; keep it stable.
fn task_text(mode: AdvisorMode, language: &str, completion: &str) -> String {
    let screen = match mode {
        AdvisorMode::Image => "the attached screenshot",
        AdvisorMode::UiTree => "the UI structure under \"current_ui_tree\"",
    };

    let mut task = format!(
        "Inspect the current screen and the user's stated goal; determine whether the goal is already satisfied.\n\
The user usually wants to do something on the phone but does not know how. Observe {screen}.\n\
Reply with JSON only:\n\
- If the screen already shows that the user's goal is achieved, reply {{\"mission_achieved\": true, \"ai_response\": \"{completion}\"}}.\n\
- Otherwise tell the user the single next step (which box to tap, what to type, and so on) in under {ADVICE_CHAR_HINT} characters, reply {{\"mission_achieved\": false, \"ai_response\": \"<next step>\"}}."
    );

    if mode == AdvisorMode::UiTree {
        task.push_str(
            "\n- When the goal is not achieved, also set \"selected_ui_element\" to the element the user should act on, \
copied verbatim (className, text, contentDescription, viewId, bounds) from \"current_ui_tree\". \
Use null when the goal is achieved or no element applies.",
        );
    }

    task.push_str(&format!("\nWrite \"ai_response\" in the language {language}."));
    task
}

pub fn build_advisor_prompt(
    transcript: &str,
    mode: AdvisorMode,
    tree: Option<&UiTree>,
    prior: Option<&PriorContext>,
    opts: &PromptOptions<'_>,
) -> AdvisorPrompt {
    let transcript = filter_transcription_output(transcript);

    let mut user = serde_json::Map::new();
    user.insert(
        "task".into(),
        Value::String(task_text(mode, opts.language, opts.completion_message)),
    );
    user.insert("user_question".into(), Value::String(transcript));

    if mode == AdvisorMode::UiTree {
        if let Some(p) = prior.filter(|p| !p.as_str().trim().is_empty()) {
            // Parsed when possible so the model sees structure, not an escaped string.
            let hint = serde_json::from_str::<Value>(p.as_str())
                .unwrap_or_else(|_| Value::String(p.as_str().to_string()));
            user.insert("reference_ui_structure".into(), hint);
        }
        let tree = tree
            .and_then(|t| serde_json::to_value(t).ok())
            .unwrap_or(Value::Null);
        user.insert("current_ui_tree".into(), tree);
    }

    let system = opts
        .system_instruction
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default_system_instruction(mode))
        .to_string();

    AdvisorPrompt {
        system_instruction: system,
        user_message: Value::Object(user).to_string(),
    }
}

fn element_schema() -> Value {
    json!({
        "type": "OBJECT",
        "nullable": true,
        "properties": {
            "className": {"type": "STRING"},
            "text": {"type": "STRING"},
            "contentDescription": {"type": "STRING"},
            "viewId": {"type": "STRING"},
            "bounds": {
                "type": "OBJECT",
                "properties": {
                    "l": {"type": "INTEGER"},
                    "t": {"type": "INTEGER"},
                    "r": {"type": "INTEGER"},
                    "b": {"type": "INTEGER"}
                },
                "required": ["l", "t", "r", "b"]
            }
        }
    })
}

/// Response schema in the OpenAPI subset accepted by `generationConfig.responseSchema`.
pub fn response_schema(mode: AdvisorMode) -> Value {
    match mode {
        AdvisorMode::Image => json!({
            "type": "OBJECT",
            "properties": {
                "mission_achieved": {"type": "BOOLEAN"},
                "ai_response": {"type": "STRING"}
            },
            "required": ["mission_achieved", "ai_response"]
        }),
        AdvisorMode::UiTree => json!({
            "type": "OBJECT",
            "properties": {
                "mission_achieved": {"type": "BOOLEAN"},
                "ai_response": {"type": "STRING"},
                "selected_ui_element": element_schema()
            },
            "required": ["mission_achieved", "ai_response", "selected_ui_element"]
        }),
    }
}
