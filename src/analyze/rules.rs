//! Keyword rule tables.
//!
//! Two ordered tables, each a list of `{pattern, effect}` pairs matched against
//! lower-cased `title + " " + summary`:
//! - tag rules:   effect = add one topic tag (at most once per rule)
//! - boost rules: effect = multiply the hot score by `factor` (boosts stack)
//!
//! Patterns are `regex` syntax and include Chinese variants. Custom tables can be
//! deserialized from JSON/TOML specs and compiled with `from_specs`.

use anyhow::anyhow;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct TagRuleSpec {
    pub tag: String,
    pub pattern: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoostRuleSpec {
    pub name: String,
    pub pattern: String,
    pub factor: f64,
}

#[derive(Debug)]
struct CompiledTag {
    tag: String,
    re: Regex,
}

#[derive(Debug)]
struct CompiledBoost {
    re: Regex,
    factor: f64,
}

const BUILTIN_TAGS: &[(&str, &str)] = &[
    (
        "Autonomous Driving",
        r"autonomous driving|self-driving|自动驾驶|自動駕駛",
    ),
    ("Robotics", r"\brobot\b|robotics|机器人"),
    ("Embodied AI", r"embodied|具身智能"),
    ("LLM", r"large language model|\bllm\b"),
    ("RL", r"reinforcement learning|\brl\b"),
    ("Vision", r"vision|perception|视觉"),
    ("Planning", r"planning|mpc|slam|mapping"),
];

const BUILTIN_BOOSTS: &[(&str, &str, f64)] = &[
    ("survey", r"survey|综述", 1.15),
    ("benchmark", r"benchmark|dataset|数据集|基准", 1.10),
    ("embodied", r"embodied|具身", 1.08),
    (
        "autonomous_driving",
        r"autonomous driving|self-driving|自动驾驶|自動駕駛",
        1.06,
    ),
];

/// Ordered topic tagger.
#[derive(Debug)]
pub struct TagRules {
    rules: Vec<CompiledTag>,
}

impl TagRules {
    pub fn builtin() -> &'static TagRules {
        static RULES: OnceCell<TagRules> = OnceCell::new();
        RULES.get_or_init(|| {
            let specs = BUILTIN_TAGS
                .iter()
                .map(|(tag, pattern)| TagRuleSpec {
                    tag: tag.to_string(),
                    pattern: pattern.to_string(),
                })
                .collect();
            TagRules::from_specs(specs).expect("builtin tag rules compile")
        })
    }

    pub fn from_specs(specs: Vec<TagRuleSpec>) -> anyhow::Result<Self> {
        let rules = specs
            .into_iter()
            .map(|s| {
                let re = Regex::new(&s.pattern)
                    .map_err(|e| anyhow!("tag rule `{}` regex error: {}", s.tag, e))?;
                Ok(CompiledTag { tag: s.tag, re })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Tags in rule order; a tag appears at most once.
    pub fn tags_for(&self, title: &str, summary: &str) -> Vec<String> {
        let text = format!("{title} {summary}").to_lowercase();
        let mut out: Vec<String> = Vec::new();
        for r in &self.rules {
            if r.re.is_match(&text) && !out.contains(&r.tag) {
                out.push(r.tag.clone());
            }
        }
        out
    }
}

/// Multiplicative topical boosts for the hot score.
#[derive(Debug)]
pub struct BoostRules {
    rules: Vec<CompiledBoost>,
}

impl BoostRules {
    pub fn builtin() -> &'static BoostRules {
        static RULES: OnceCell<BoostRules> = OnceCell::new();
        RULES.get_or_init(|| {
            let specs = BUILTIN_BOOSTS
                .iter()
                .map(|(name, pattern, factor)| BoostRuleSpec {
                    name: name.to_string(),
                    pattern: pattern.to_string(),
                    factor: *factor,
                })
                .collect();
            BoostRules::from_specs(specs).expect("builtin boost rules compile")
        })
    }

    pub fn from_specs(specs: Vec<BoostRuleSpec>) -> anyhow::Result<Self> {
        let rules = specs
            .into_iter()
            .map(|s| {
                if !s.factor.is_finite() || s.factor <= 0.0 {
                    return Err(anyhow!("boost rule `{}` has invalid factor {}", s.name, s.factor));
                }
                let re = Regex::new(&s.pattern)
                    .map_err(|e| anyhow!("boost rule `{}` regex error: {}", s.name, e))?;
                Ok(CompiledBoost {
                    re,
                    factor: s.factor,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Product of the factors of every matching rule (1.0 when none match).
    /// `text` must already be lower-cased.
    pub fn factor_for(&self, text: &str) -> f64 {
        self.rules
            .iter()
            .filter(|r| r.re.is_match(text))
            .map(|r| r.factor)
            .product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tags_follow_rule_order() {
        let tags = TagRules::builtin().tags_for(
            "SLAM for self-driving cars",
            "A robot uses vision and reinforcement learning.",
        );
        assert_eq!(
            tags,
            vec!["Autonomous Driving", "Robotics", "RL", "Vision", "Planning"]
        );
    }

    #[test]
    fn word_boundaries_and_bilingual_variants() {
        let r = TagRules::builtin();
        assert!(r.tags_for("Robots everywhere", "").is_empty());
        assert_eq!(r.tags_for("具身智能 与 机器人", ""), vec!["Robotics", "Embodied AI"]);
        assert_eq!(r.tags_for("An LLM agent", ""), vec!["LLM"]);
        assert!(r.tags_for("control flow", "").is_empty());
    }

    #[test]
    fn custom_specs_compile_and_bad_regex_fails() {
        let r = TagRules::from_specs(vec![TagRuleSpec {
            tag: "Drones".into(),
            pattern: r"\bdrones?\b|uav".into(),
        }])
        .unwrap();
        assert_eq!(r.tags_for("UAV swarms", ""), vec!["Drones"]);

        let bad = TagRules::from_specs(vec![TagRuleSpec {
            tag: "Broken".into(),
            pattern: "(".into(),
        }]);
        assert!(bad.is_err());
    }

    #[test]
    fn boosts_stack_multiplicatively() {
        let b = BoostRules::builtin();
        let f = b.factor_for("a survey of embodied ai");
        assert!((f - 1.15 * 1.08).abs() < 1e-12);
        assert_eq!(b.factor_for("nothing to see"), 1.0);

        let all = b.factor_for("survey benchmark embodied autonomous driving");
        assert!((all - 1.15 * 1.10 * 1.08 * 1.06).abs() < 1e-12);
    }

    #[test]
    fn non_positive_factor_is_rejected() {
        let bad = BoostRules::from_specs(vec![BoostRuleSpec {
            name: "zero".into(),
            pattern: "x".into(),
            factor: 0.0,
        }]);
        assert!(bad.is_err());
    }
}
