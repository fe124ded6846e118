//! Plan export to PDF.
//!
//! Rendering sits behind [`PlanRenderer`] so a richer renderer can replace
//! [`SimplePdfRenderer`] without touching the plan service.

use std::fmt::Write as _;

use async_trait::async_trait;
use fitup_core::plan::metadata::{AlgorithmParameters, PlannedDay, PlannedExercise};
use fitup_db::models::plan::Plan;

const PAGE_WIDTH: u32 = 595;
const PAGE_HEIGHT: u32 = 842;
const MARGIN_LEFT: u32 = 50;
const TOP_BASELINE: u32 = 790;
const FONT_SIZE: u32 = 11;
const LEADING: u32 = 15;
const LINES_PER_PAGE: usize = 48;

const DAY_NAMES: [&str; 7] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"];

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("PDF formatting failed: {0}")]
    Format(#[from] std::fmt::Error),
}

#[async_trait]
pub trait PlanRenderer: Send + Sync {
    async fn render(&self, plan: &Plan) -> Result<Vec<u8>, RenderError>;
}

/// Text-only PDF 1.4 renderer using the built-in Helvetica font.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplePdfRenderer;

#[async_trait]
impl PlanRenderer for SimplePdfRenderer {
    async fn render(&self, plan: &Plan) -> Result<Vec<u8>, RenderError> {
        let lines = plan_lines(plan);
        let mut pages: Vec<&[String]> = lines.chunks(LINES_PER_PAGE).collect();
        if pages.is_empty() {
            pages.push(&[]);
        }
        build_document(&pages)
    }
}

/// The plan as printable lines, day by day.
pub fn plan_lines(plan: &Plan) -> Vec<String> {
    let AlgorithmParameters::AdaptiveV1(params) = &plan.metadata.parameters;
    let request = &params.request;
    let mut lines = vec![
        format!("Workout plan #{}", plan.id),
        format!("Week of {}", plan.week_start),
        format!("Template: {}", plan.metadata.template),
        format!(
            "Level: {}, {} sessions per week, {} min per workout",
            request.level, request.weekly_frequency, request.time_per_workout
        ),
        format!("Progression: {}", plan.metadata.progression_method),
        format!("Estimated weekly sets: {}", plan.metadata.estimated_weekly_volume),
        String::new(),
    ];
    for day in &plan.metadata.structure {
        lines.extend(day_lines(day));
        lines.push(String::new());
    }
    lines
}

fn day_lines(day: &PlannedDay) -> Vec<String> {
    let name = usize::try_from(day.day_of_week - 1)
        .ok()
        .and_then(|i| DAY_NAMES.get(i))
        .copied()
        .unwrap_or("Day");
    if day.rest {
        return vec![format!("{name}: Rest")];
    }
    let mut lines = vec![format!("{name}: {}", day.focus)];
    lines.extend(day.exercises.iter().map(exercise_line));
    lines
}

fn exercise_line(exercise: &PlannedExercise) -> String {
    let mut line = format!(
        "  {}. {}  {} x {}, rest {}s",
        exercise.order_index + 1,
        exercise.name,
        exercise.sets,
        exercise.reps,
        exercise.rest_seconds
    );
    if let Some(load) = exercise.load_target_kg {
        line.push_str(&format!(", target {load} kg"));
    }
    line
}

/// Escape a line for a PDF literal string. Non-ASCII falls back to `?`
/// because the standard Helvetica encoding has no Unicode mapping.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

fn content_stream(lines: &[String]) -> Result<String, RenderError> {
    let mut stream = String::new();
    write!(
        stream,
        "BT\n/F1 {FONT_SIZE} Tf\n{LEADING} TL\n{MARGIN_LEFT} {TOP_BASELINE} Td\n"
    )?;
    for line in lines {
        writeln!(stream, "({}) Tj T*", escape(line))?;
    }
    stream.push_str("ET\n");
    Ok(stream)
}

/// Assemble catalog, page tree, font, pages and the cross-reference table.
fn build_document(pages: &[&[String]]) -> Result<Vec<u8>, RenderError> {
    // Objects 1..=3 are catalog, page tree and font; each page adds a page
    // object followed by its content stream.
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 4 + 2 * i).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];
    for (lines, page_id) in pages.iter().zip(&page_ids) {
        let stream = content_stream(lines)?;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            page_id + 1
        ));
        objects.push(format!("<< /Length {} >>\nstream\n{stream}endstream", stream.len()));
    }

    let mut out = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        write!(out, "{} 0 obj\n{body}\nendobj\n", index + 1)?;
    }

    let xref_offset = out.len();
    write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1)?;
    for offset in offsets {
        write!(out, "{offset:010} 00000 n \n")?;
    }
    write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    )?;
    Ok(out.into_bytes())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use fitup_core::catalog::seed_candidates;
    use fitup_core::fitness::{Equipment, FitnessGoal, FitnessLevel};
    use fitup_core::plan::{generate_plan, PlanRequest};

    use super::*;

    fn plan() -> Plan {
        let request = PlanRequest {
            goals: vec![FitnessGoal::Strength],
            equipment: vec![Equipment::Barbell, Equipment::Dumbbell, Equipment::Bodyweight],
            level: FitnessLevel::Intermediate,
            weekly_frequency: 4,
            time_per_workout: 60,
            limitations: Vec::new(),
            recovery: None,
            one_rep_maxes: Vec::new(),
        };
        Plan {
            id: 12,
            user_id: "user-1".into(),
            week_start: NaiveDate::from_ymd_opt(2026, 10, 12).unwrap(),
            generated_at: Utc::now(),
            algorithm: "fitup_adaptive_v1".into(),
            active: true,
            regeneration_requested: false,
            regeneration_reason: None,
            metadata: generate_plan(&request, &seed_candidates()).unwrap(),
        }
    }

    #[test]
    fn escapes_delimiters_and_non_ascii() {
        assert_eq!(escape(r"a(b)c\d"), r"a\(b\)c\\d");
        assert_eq!(escape("Überzug"), "?berzug");
    }

    #[test]
    fn lines_cover_every_day() {
        let lines = plan_lines(&plan());
        assert_eq!(lines[0], "Workout plan #12");
        for day in DAY_NAMES {
            assert!(lines.iter().any(|l| l.starts_with(day)), "missing {day}");
        }
        assert!(lines.iter().any(|l| l.ends_with(": Rest")));
    }

    #[tokio::test]
    async fn renders_a_well_formed_document() {
        let bytes = SimplePdfRenderer.render(&plan()).await.unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("%PDF-1.4\n"));
        assert!(text.ends_with("%%EOF\n"));
        assert!(text.contains("(Workout plan #12) Tj"));

        // startxref points at the xref table.
        let startxref: usize = text
            .rsplit("startxref\n")
            .next()
            .and_then(|tail| tail.lines().next())
            .unwrap()
            .parse()
            .unwrap();
        assert!(text[startxref..].starts_with("xref\n"));

        // Every xref entry points at its object header.
        let table = &text[startxref..];
        for (i, entry) in table.lines().skip(3).take_while(|l| l.ends_with(" n ")).enumerate() {
            let offset: usize = entry[..10].parse().unwrap();
            assert!(text[offset..].starts_with(&format!("{} 0 obj", i + 1)));
        }
    }

    #[tokio::test]
    async fn long_plans_span_pages() {
        let mut plan = plan();
        let template = plan.metadata.structure[0].clone();
        for _ in 0..20 {
            plan.metadata.structure.push(template.clone());
        }
        let text = String::from_utf8(SimplePdfRenderer.render(&plan).await.unwrap()).unwrap();
        let count: usize = text
            .split("/Count ")
            .nth(1)
            .and_then(|s| s.split_whitespace().next())
            .unwrap()
            .parse()
            .unwrap();
        assert!(count > 1);
    }
}
