// ============================================================
// Layer 3 — Recommendation Engine
// ============================================================
// A declarative rule table evaluated top to bottom. Every rule
// whose tier matches and whose condition holds contributes one
// piece of advice, so the output order is the table order.
//
//   Tier   | Condition        | Advice
//   -------+------------------+------------------------
//   High   | always           | Immediate intervention
//   High   | attendance < 70  | Improve attendance
//   High   | mid-term < 50    | Intensify exam prep
//   High   | GPA < 2.5        | Strengthen foundations
//   Medium | always           | Monitor progress
//   Medium | attendance < 80  | Encourage attendance
//   Medium | mid-term < 65    | More study time
//   Low    | always           | Performing well
//   Low    | always           | Suggest enrichment
//
// Adding a rule means adding a row to RULES; nothing else changes.

use serde::Serialize;

use crate::domain::risk::RiskTier;
use crate::domain::student::FeatureVector;

/// When a rule fires, beyond matching its tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Condition {
    Always,
    AttendanceBelow(f64),
    MidTermBelow(f64),
    GpaBelow(f64),
}

impl Condition {
    pub fn holds(self, indicators: &FeatureVector) -> bool {
        match self {
            Self::Always              => true,
            Self::AttendanceBelow(t) => indicators.attendance < t,
            Self::MidTermBelow(t)    => indicators.mid_term_marks < t,
            Self::GpaBelow(t)        => indicators.previous_gpa < t,
        }
    }
}

/// One piece of advice: a short code and the sentence shown to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Advice {
    pub code:    &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub tier:      RiskTier,
    pub condition: Condition,
    pub advice:    Advice,
}

const fn rule(tier: RiskTier, condition: Condition, code: &'static str, message: &'static str) -> Rule {
    Rule { tier, condition, advice: Advice { code, message } }
}

pub const RULES: &[Rule] = &[
    rule(RiskTier::High, Condition::Always, "Immediate intervention",
        "Immediate intervention is recommended."),
    rule(RiskTier::High, Condition::AttendanceBelow(70.0), "Improve attendance",
        "Focus on improving attendance to ensure better learning opportunities."),
    rule(RiskTier::High, Condition::MidTermBelow(50.0), "Intensify exam prep",
        "Intensify preparation for final exams; consider tutoring or study groups."),
    rule(RiskTier::High, Condition::GpaBelow(2.5), "Strengthen foundations",
        "Strengthen foundational concepts from previous academic terms."),
    rule(RiskTier::Medium, Condition::Always, "Monitor progress",
        "Monitor student progress closely and offer support as needed."),
    rule(RiskTier::Medium, Condition::AttendanceBelow(80.0), "Encourage attendance",
        "Encourage consistent attendance to keep up with coursework."),
    rule(RiskTier::Medium, Condition::MidTermBelow(65.0), "More study time",
        "Dedicate more time to understanding challenging topics before final exams."),
    rule(RiskTier::Low, Condition::Always, "Performing well",
        "Student is performing well. Encourage continued excellence."),
    rule(RiskTier::Low, Condition::Always, "Suggest enrichment",
        "Suggest participation in advanced topics or extracurricular activities to further enrich their learning."),
];

/// Evaluate the default rule table
pub fn recommend(indicators: &FeatureVector, tier: RiskTier) -> Vec<Advice> {
    recommend_with(RULES, indicators, tier)
}

/// Evaluate an arbitrary rule table in order
pub fn recommend_with(rules: &[Rule], indicators: &FeatureVector, tier: RiskTier) -> Vec<Advice> {
    rules
        .iter()
        .filter(|r| r.tier == tier && r.condition.holds(indicators))
        .map(|r| r.advice)
        .collect()
}
