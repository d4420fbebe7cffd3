//! Tone calibration for cover letters.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Professional,
    Enthusiastic,
    Concise,
    Friendly,
}

impl Tone {
    /// Instruction handed to the model.
    pub fn guidance(self) -> &'static str {
        match self {
            Tone::Professional => {
                "Polished and confident. Measured language, no exclamation marks, no slang."
            }
            Tone::Enthusiastic => {
                "Energetic and warm. Show genuine excitement about the company and the role, \
                 but stay credible and specific."
            }
            Tone::Concise => {
                "Brief and direct. Short sentences, three paragraphs at most, no filler phrases."
            }
            Tone::Friendly => {
                "Approachable and personable, as if writing to a future colleague. \
                 Plain words, still professional."
            }
        }
    }

    /// Opening sentence used when no model is available.
    pub fn fallback_opening(self, job_title: &str, company_name: &str) -> String {
        match self {
            Tone::Professional => format!(
                "I am writing to apply for the {job_title} position at {company_name}."
            ),
            Tone::Enthusiastic => format!(
                "I was excited to see the {job_title} opening at {company_name}, and I would love to join the team."
            ),
            Tone::Concise => format!("I am applying for the {job_title} role at {company_name}."),
            Tone::Friendly => format!(
                "I came across the {job_title} role at {company_name} and it immediately felt like a great fit."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_wire_format() {
        let tone: Tone = serde_json::from_str(r#""enthusiastic""#).unwrap();
        assert_eq!(tone, Tone::Enthusiastic);
        assert!(serde_json::from_str::<Tone>(r#""sarcastic""#).is_err());
    }

    #[test]
    fn test_default_tone_is_professional() {
        assert_eq!(Tone::default(), Tone::Professional);
        assert!(!Tone::default().guidance().contains('!'));
    }

    #[test]
    fn test_fallback_opening_mentions_role_and_company() {
        for tone in [Tone::Professional, Tone::Enthusiastic, Tone::Concise, Tone::Friendly] {
            let opening = tone.fallback_opening("Backend Engineer", "Acme");
            assert!(opening.contains("Backend Engineer"));
            assert!(opening.contains("Acme"));
        }
    }
}
