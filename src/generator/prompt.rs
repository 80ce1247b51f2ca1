use super::GenerationRequest;

/// Build the instruction sent to the model for one spark
pub fn build_prompt(request: &GenerationRequest<'_>) -> String {
    let details = request
        .goal_description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| format!("GOAL DETAILS: {}\n", d))
        .unwrap_or_default();

    let previous = if request.previous_sparks.is_empty() {
        String::new()
    } else {
        let lines: Vec<String> = request
            .previous_sparks
            .iter()
            .enumerate()
            .map(|(i, spark)| format!("{}. {}", i + 1, spark.title))
            .collect();
        format!("SPARKS ALREADY COMPLETED:\n{}\n", lines.join("\n"))
    };

    format!(
        r#"You are Spark, an AI that helps people overcome procrastination by generating tiny, achievable first steps.

USER'S GOAL: "{title}"
{details}
{previous}

Generate the next TINY micro-action (a "spark") that will help them make progress. This should be:
- VERY small (2-5 minutes max)
- Immediately actionable
- Low barrier to entry
- Either research/learning OR a tiny preparation step
- NOT the full task, just a baby step toward it

Respond ONLY with valid JSON in this exact format:
{{
  "title": "Short action title (under 8 words)",
  "description": "Brief clarifying sentence (under 15 words)",
  "effort": "2-5 min",
  "resourceLink": "optional URL to helpful resource, or null"
}}

DO NOT include any text outside the JSON. Make it encouraging and specific to their goal."#,
        title = request.goal_title,
    )
}
