use crate::survey::{QuestionCandidate, QuestionSource, QuestionType};

/// Local sample questions offered when generation fails.
///
/// Two questions come from the inferred domain (general household questions
/// otherwise), followed by one open question about `prompt`.
pub fn mock_candidates(prompt: &str, domain: Option<&str>) -> Vec<QuestionCandidate> {
    let mut candidates = match domain {
        Some("employment") => vec![
            QuestionCandidate::new(QuestionType::Radio, "What is your current employment status?")
                .with_options(["Employed full-time", "Employed part-time", "Self-employed", "Unemployed"]),
            QuestionCandidate::new(QuestionType::Radio, "How many hours did you work last week?")
                .with_options(["0", "1-20", "21-40", "More than 40"]),
        ],
        Some("agriculture") => vec![
            QuestionCandidate::new(QuestionType::MultipleChoice, "Which crops did you grow this season?")
                .with_options(["Rice", "Wheat", "Pulses", "Vegetables", "Other"]),
            QuestionCandidate::new(QuestionType::Radio, "What is the main source of irrigation?")
                .with_options(["Canal", "Tube well", "Rain-fed", "Other"]),
        ],
        Some("prices") => vec![
            QuestionCandidate::text("What did you pay for one kilogram of rice last week?"),
            QuestionCandidate::new(QuestionType::Radio, "Compared to last month, household expenses are")
                .with_options(["Higher", "About the same", "Lower"]),
        ],
        Some("health") => vec![
            QuestionCandidate::new(QuestionType::Checkbox, "Which health facilities have you visited this year?")
                .with_options(["Government hospital", "Private clinic", "Primary health centre", "None"]),
            QuestionCandidate::new(QuestionType::Radio, "How far is the nearest health centre?")
                .with_options(["Under 1 km", "1-5 km", "Over 5 km"]),
        ],
        Some("transport") => vec![
            QuestionCandidate::new(QuestionType::Radio, "What is your main mode of daily travel?")
                .with_options(["Bus", "Train or metro", "Two-wheeler", "Car", "Walk or cycle"]),
            QuestionCandidate::new(QuestionType::Radio, "How long is your daily commute?")
                .with_options(["Under 15 minutes", "15-45 minutes", "Over 45 minutes"]),
        ],
        _ => vec![
            QuestionCandidate::new(QuestionType::Radio, "What is your age group?")
                .with_options(["18-25", "26-35", "36-45", "46-60", "60+"]),
            QuestionCandidate::text("How many people live in your household?"),
        ],
    };

    let topic = prompt.trim();
    if !topic.is_empty() {
        candidates.push(QuestionCandidate::text(format!(
            "Please describe your experience with: {}",
            topic
        )));
    }

    candidates
        .into_iter()
        .map(|c| {
            let c = c.with_source(QuestionSource::Mock);
            match domain {
                Some(d) => c.with_domain(d),
                None => c,
            }
        })
        .collect()
}
