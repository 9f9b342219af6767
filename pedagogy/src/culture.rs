//! Regional context used to ground stories and analogies.
//!
//! These tables are intentionally small. They give the language model
//! familiar names, places and references so generated material feels local.

use serde::Serialize;

use crate::types::Subject;

/// Region used when a lookup misses.
pub const DEFAULT_REGION: &str = "default_rural";

/// Customs and references for one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CulturalContext {
    pub region: String,
    pub cultural_elements: Vec<&'static str>,
    pub crops: Vec<&'static str>,
    pub festivals: Vec<&'static str>,
    pub script: &'static str,
    pub honorifics: Vec<&'static str>,
}

impl CulturalContext {
    /// Context for a region key such as `maharashtra_rural`, falling back to
    /// `default_rural`.
    pub fn lookup(region: &str) -> Self {
        match region.trim().to_lowercase().as_str() {
            "maharashtra_rural" | "maharashtra" => Self {
                region: "maharashtra_rural".to_string(),
                cultural_elements: vec!["farming", "festivals", "joint family"],
                crops: vec!["wheat", "sugarcane"],
                festivals: vec!["Ganesh Chaturthi"],
                script: "devanagari",
                honorifics: vec!["ji", "saheb"],
            },
            _ => Self {
                region: DEFAULT_REGION.to_string(),
                cultural_elements: vec!["farming", "village community", "joint family"],
                crops: vec!["wheat", "rice"],
                festivals: vec!["Diwali", "Holi"],
                script: "devanagari",
                honorifics: vec!["ji"],
            },
        }
    }

    pub fn is_default(&self) -> bool {
        self.region == DEFAULT_REGION
    }

    /// One-line description for prompts.
    pub fn prompt_summary(&self) -> String {
        format!(
            "Region: {}. Cultural elements: {}. Local crops: {}. Festivals: {}. \
             Use respectful forms of address such as {}.",
            self.region,
            self.cultural_elements.join(", "),
            self.crops.join(", "),
            self.festivals.join(", "),
            self.honorifics.join(", "),
        )
    }
}

/// Where a story takes place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorySetting {
    pub location: &'static str,
    pub description: &'static str,
}

impl StorySetting {
    pub fn for_subject(subject: Subject) -> Self {
        match subject {
            Subject::Mathematics => Self {
                location: "गाँव का बाज़ार (Village market)",
                description: "Local weekly market with various vendors",
            },
            Subject::Science => Self {
                location: "खेत और बगीचा (Farm and garden)",
                description: "Agricultural field with various crops and plants",
            },
            Subject::SocialStudies => Self {
                location: "गाँव की चौपाल (Village gathering place)",
                description: "Community meeting place under banyan tree",
            },
            Subject::Language | Subject::General => Self {
                location: "गाँव का स्कूल (Village school)",
                description: "Single-room school building with courtyard",
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryCharacter {
    pub name: &'static str,
    pub role: &'static str,
    pub age: u8,
    pub background: &'static str,
}

/// Stock cast for village stories.
pub fn story_characters() -> Vec<StoryCharacter> {
    vec![
        StoryCharacter {
            name: "राम",
            role: "student",
            age: 10,
            background: "farmer's son",
        },
        StoryCharacter {
            name: "सीता",
            role: "student",
            age: 9,
            background: "teacher's daughter",
        },
        StoryCharacter {
            name: "गुरुजी",
            role: "teacher",
            age: 45,
            background: "village teacher",
        },
        StoryCharacter {
            name: "किसान काका",
            role: "farmer",
            age: 50,
            background: "experienced farmer",
        },
    ]
}

/// A comparison to everyday village life.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CulturalAnalogy {
    /// Hindi phrase with English gloss
    pub analogy: String,
    pub explanation: String,
    pub visual_element: String,
    pub local_reference: String,
}

impl CulturalAnalogy {
    fn new(analogy: &str, explanation: &str, visual_element: &str, local_reference: &str) -> Self {
        Self {
            analogy: analogy.to_string(),
            explanation: explanation.to_string(),
            visual_element: visual_element.to_string(),
            local_reference: local_reference.to_string(),
        }
    }
}

/// Hand-written analogies for a few concepts; empty for anything else.
pub fn builtin_analogies(concept: &str) -> Vec<CulturalAnalogy> {
    match concept.trim().to_lowercase().as_str() {
        "photosynthesis" | "plant growth" => vec![
            CulturalAnalogy::new(
                "किसान और खेत की तरह (Like a farmer and field)",
                "जैसे किसान मिट्टी, पानी और धूप का उपयोग करके फसल उगाता है, वैसे ही पेड़-पौधे मिट्टी, पानी और सूरज की रोशनी का उपयोग करके अपना भोजन बनाते हैं।",
                "Farmer tending to crops with sun, water, and soil",
                "गेहूं या धान की खेती",
            ),
            CulturalAnalogy::new(
                "रसोई में खाना बनाने की तरह (Like cooking in kitchen)",
                "माँ रसोई में अलग-अलग सामग्री मिलाकर खाना बनाती है, वैसे ही पत्ते सूरज की रोशनी, हवा और पानी मिलाकर अपना भोजन बनाते हैं।",
                "Mother cooking with various ingredients",
                "घर की रसोई और पारंपरिक खाना पकाना",
            ),
        ],
        "fractions" | "parts" | "division" => vec![
            CulturalAnalogy::new(
                "रोटी के टुकड़े (Pieces of roti)",
                "जब माँ एक रोटी को चार भागों में बांटती है, तो हर टुकड़ा 1/4 (एक चौथाई) होता है। चार टुकड़े मिलकर पूरी रोटी (4/4 = 1) बनती है।",
                "Roti divided into equal parts",
                "दैनिक भोजन और परिवार में बांटना",
            ),
            CulturalAnalogy::new(
                "खेत का बंटवारा (Division of farmland)",
                "किसान अपने खेत को अलग-अलग फसलों के लिए हिस्सों में बांटता है। अगर आधा खेत गेहूं के लिए है तो वो 1/2 हिस्सा है।",
                "Farmland divided for different crops",
                "कृषि और भूमि विभाजन",
            ),
        ],
        _ => Vec::new(),
    }
}

/// Tips shown alongside analogies.
pub const ANALOGY_TEACHING_TIPS: &[&str] = &[
    "Start with the most familiar analogy first",
    "Use visual aids and real objects when possible",
    "Encourage students to share their own analogies",
    "Connect back to students' personal experiences",
];

/// Follow-up questions asked after reading a story aloud.
pub const STORY_DISCUSSION_QUESTIONS: &[&str] = &[
    "कहानी में मुख्य पात्र कौन था?",
    "आपने इस कहानी से क्या सीखा?",
    "क्या आप भी ऐसी कोई चीज़ जानते हैं?",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_lookup() {
        let ctx = CulturalContext::lookup("Maharashtra_Rural");
        assert_eq!(ctx.region, "maharashtra_rural");
        assert_eq!(ctx.festivals, vec!["Ganesh Chaturthi"]);
        assert!(!ctx.is_default());

        let fallback = CulturalContext::lookup("atlantis");
        assert!(fallback.is_default());
        assert!(fallback.prompt_summary().contains("default_rural"));
    }

    #[test]
    fn test_setting_by_subject() {
        assert_eq!(
            StorySetting::for_subject(Subject::Mathematics).location,
            "गाँव का बाज़ार (Village market)"
        );
        assert_eq!(
            StorySetting::for_subject(Subject::General).location,
            "गाँव का स्कूल (Village school)"
        );
    }

    #[test]
    fn test_builtin_analogies() {
        assert_eq!(builtin_analogies("Photosynthesis").len(), 2);
        assert_eq!(
            builtin_analogies("division")[0].analogy,
            "रोटी के टुकड़े (Pieces of roti)"
        );
        assert!(builtin_analogies("gravity").is_empty());
    }

    #[test]
    fn test_story_characters() {
        let cast = story_characters();
        assert_eq!(cast.len(), 4);
        assert_eq!(cast[2].role, "teacher");
    }
}
