//! Prompt templates for Recap.
//!
//! Prompts can be customized by placing a `summary.toml` file in the custom prompts
//! directory. Templates use `{{name}}` placeholders.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub summary: SummaryPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for segment summaries and the final abstract.
///
/// The section labels in `segment` are part of the response contract parsed by
/// `summary::parse`; custom templates must keep them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    /// Per-segment analysis. Variables: `language`, `segment_number`,
    /// `segment_count`, `previous_context`, `transcript`.
    pub segment: String,
    /// Summary of summaries. Variables: `language`, `segment_count`, `abstracts`.
    pub abstract_merge: String,
    /// Appended after a response that broke the format. Variable: `missing`.
    pub clarify: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            segment: r#"Please analyze the following transcript in {{language}} and provide:
1. A brief abstract (2-3 sentences)
2. Key concepts (bullet points)
3. Topic categories (bullet points)
4. A detailed summary (2-4 paragraphs)

Please provide the analysis in the same language as the transcript ({{language}}).

This is part {{segment_number}} of {{segment_count}} of the full transcript.
{{previous_context}}
Format your response exactly like this:
ABSTRACT:
(your abstract here)

KEY CONCEPTS:
• (concept 1)
• (concept 2)
...

TOPICS:
• (topic 1)
...

DETAILED SUMMARY:
(your detailed summary here)

Transcript:
{{transcript}}
"#
            .to_string(),

            abstract_merge: r#"The following are abstracts of {{segment_count}} consecutive parts of one video transcript in {{language}}.

Write a single abstract (2-3 sentences) for the whole video. Do not describe the parts separately. Answer in {{language}}.

Format your response exactly like this:
ABSTRACT:
(your abstract here)

Part abstracts:
{{abstracts}}
"#
            .to_string(),

            clarify: r#"Your previous answer could not be used because it is missing these sections: {{missing}}.

Answer again using exactly the section labels requested, each on its own line followed by a colon."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are substituted in one pass over the template, so text
    /// inserted for one variable is never scanned for further placeholders.
    /// Unknown placeholders are left as written.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find("{{") {
            result.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            match after.find("}}") {
                Some(close) => {
                    let name = &after[..close];
                    match vars.get(name.trim()) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(name);
                            result.push_str("}}");
                        }
                    }
                    rest = &after[close + 2..];
                }
                None => {
                    result.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }

        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts_carry_section_labels() {
        let prompts = Prompts::default();
        for label in ["ABSTRACT:", "KEY CONCEPTS:", "TOPICS:", "DETAILED SUMMARY:"] {
            assert!(prompts.summary.segment.contains(label), "missing {label}");
        }
        assert!(prompts.summary.abstract_merge.contains("{{abstracts}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_substituted_values_are_not_rendered_again() {
        let mut vars = HashMap::new();
        vars.insert("language".to_string(), "en".to_string());
        vars.insert(
            "transcript".to_string(),
            "he typed {{language}} and {{missing}} on screen".to_string(),
        );

        let out = Prompts::render("[{{language}}] {{transcript}} {{unknown}}", &vars);
        assert_eq!(
            out,
            "[en] he typed {{language}} and {{missing}} on screen {{unknown}}"
        );
    }

    #[test]
    fn test_unclosed_placeholder_is_kept() {
        let vars = HashMap::from([("a".to_string(), "1".to_string())]);
        assert_eq!(Prompts::render("{{a}} and {{b", &vars), "1 and {{b");
    }

    #[test]
    fn test_provided_vars_override_custom() {
        let mut prompts = Prompts::default();
        prompts
            .variables
            .insert("audience".to_string(), "engineers".to_string());
        prompts
            .variables
            .insert("language".to_string(), "de".to_string());

        let mut vars = HashMap::new();
        vars.insert("language".to_string(), "fr".to_string());

        let out = prompts.render_with_custom("{{language}} for {{audience}}", &vars);
        assert_eq!(out, "fr for engineers");
    }

    #[test]
    fn test_load_custom_summary_prompts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("summary.toml"),
            "segment = \"ABSTRACT:\\n{{transcript}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.summary.segment, "ABSTRACT:\n{{transcript}}");
        // Unspecified templates keep their defaults.
        assert!(prompts.summary.clarify.contains("{{missing}}"));
    }
}
