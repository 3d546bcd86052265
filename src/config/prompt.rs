use serde::Deserialize;

/// Confirmation prompt behaviour.
#[derive(Debug, Clone, Default)]
pub struct PromptSection {
    pub assume_yes: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct RawPromptSection {
    pub assume_yes: Option<bool>,
}

pub fn parse_prompt_section(raw: Option<RawPromptSection>) -> PromptSection {
    let prompt_raw = raw.unwrap_or_default();
    PromptSection {
        assume_yes: prompt_raw.assume_yes.unwrap_or(false),
    }
}
