//! Business records and the builders that turn them into a [`DocumentSpec`].
//!
//! Records arrive as loosely-typed JSON from the storage layer: every field
//! may be missing, answers may be strings, numbers or arrays. The builders fill
//! gaps with placeholders ("Untitled Project", "Not answered yet", ...) so a
//! sparse record still produces a complete document.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Answer, Block, DocumentSpec, Field, Metadata, Section};

pub const UNTITLED_PROJECT: &str = "Untitled Project";
pub const NO_DESCRIPTION: &str = "No description available";
pub const NOT_SPECIFIED: &str = "Not specified";
pub const NOT_ANSWERED: &str = "Not answered yet";
pub const GENERAL_SECTION: &str = "General Information";
/// Footer slots of the analysis report.
pub const REPORT_TAGLINE: &str = "AI-Powered Project Analysis";
pub const REPORT_NOTICE: &str = "CONFIDENTIAL - AI GENERATED";
/// Put before the page numbers of the detailed report.
pub const DETAILED_PAGE_LABEL: &str = "Detailed Report";
const DEFAULT_CURRENCY: &str = "MAD";
const DEFAULT_SECTION_KEY: &str = "general";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientRef {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectRecord {
    #[serde(alias = "_id")]
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub client: Option<ClientRef>,
    pub category: Option<String>,
    pub priority: Option<String>,
    /// ISO date or RFC 3339 timestamp.
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuestionRecord {
    pub question: Option<String>,
    pub answer: Option<Value>,
    /// Grouping key.
    pub section: Option<String>,
    pub section_name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub order: Option<i64>,
}

impl QuestionRecord {
    /// The answer as display text, or `None` when unanswered.
    pub fn answer_text(&self) -> Option<String> {
        let text = match self.answer.as_ref()? {
            Value::Null => return None,
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
            other => other.to_string(),
        };
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    /// Color questions render their answer as swatches.
    pub fn is_color_question(&self) -> bool {
        self.kind
            .as_deref()
            .map(|k| k.to_ascii_lowercase().contains("color"))
            .unwrap_or(false)
    }

    fn to_answer(&self) -> Answer {
        match (self.answer_text(), self.is_color_question()) {
            (Some(text), true) => Answer::colors_from_csv(&text),
            (None, true) => Answer::ColorSwatchList(Vec::new()),
            (Some(text), false) => Answer::Text(text),
            (None, false) => Answer::Text(NOT_ANSWERED.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemplateRecord {
    pub title: Option<String>,
    pub short_desc: Option<String>,
    /// Semi-structured template definition.
    pub structure: Option<String>,
    pub colors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Recommendation {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Risk {
    pub description: Option<String>,
    pub severity: Option<String>,
    pub mitigation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: Option<String>,
    pub executive_summary: Option<String>,
    pub confidence: Option<f64>,
    pub complexity: Option<String>,
    pub recommendations: Vec<Recommendation>,
    pub risks: Vec<Risk>,
    pub technical_requirements: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TechnicalSpec {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Long-form analysis behind the detailed report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetailedAnalysisRecord {
    pub executive_summary: Option<String>,
    pub technical_specs: Vec<TechnicalSpec>,
    pub implementation_plan: Option<String>,
}

/// Input bundle for the project brief.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectBundle {
    pub project: ProjectRecord,
    pub questions: Vec<QuestionRecord>,
    pub template: Option<TemplateRecord>,
}

/// Input bundle for the analysis report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisBundle {
    pub project: ProjectRecord,
    pub analysis: AnalysisRecord,
}

/// Input bundle for the detailed report. Without `fullAnalysis` the report
/// is the cover, contents and a placeholder page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetailedReportBundle {
    pub project: ProjectRecord,
    pub full_analysis: Option<DetailedAnalysisRecord>,
}

impl ProjectBundle {
    pub fn to_document(&self, generated_at: DateTime<Utc>) -> DocumentSpec {
        project_document(
            &self.project,
            &self.questions,
            self.template.as_ref(),
            generated_at,
        )
    }
}

impl AnalysisBundle {
    pub fn to_document(&self, generated_at: DateTime<Utc>) -> DocumentSpec {
        analysis_report(&self.project, &self.analysis, generated_at)
    }
}

impl DetailedReportBundle {
    pub fn to_document(&self, generated_at: DateTime<Utc>) -> DocumentSpec {
        detailed_report(&self.project, self.full_analysis.as_ref(), generated_at)
    }
}

fn or_placeholder(value: Option<&str>, placeholder: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => placeholder.to_string(),
    }
}

/// Render an ISO date or timestamp as "March 4, 2024"; unparseable input is
/// shown as given.
fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return NOT_SPECIFIED.to_string();
    };
    let date = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));
    match date {
        Ok(d) => d.format("%B %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < 1e15 {
        format!("{}", amount as i64)
    } else {
        format!("{:.2}", amount)
    }
}

fn format_budget(project: &ProjectRecord) -> String {
    format!(
        "{} {}",
        format_amount(project.budget.unwrap_or(0.0)),
        or_placeholder(project.currency.as_deref(), DEFAULT_CURRENCY)
    )
}

fn generated_caption(generated_at: DateTime<Utc>) -> Block {
    Block::caption(format!(
        "Generated on: {}",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ))
}

struct QuestionGroup<'a> {
    name: String,
    questions: Vec<&'a QuestionRecord>,
}

/// Group questions by section key in order of first appearance, then order
/// each group by its `order` field (unordered questions keep input order, last).
fn group_questions(questions: &[QuestionRecord]) -> Vec<QuestionGroup<'_>> {
    let mut keys: Vec<String> = Vec::new();
    let mut groups: Vec<QuestionGroup<'_>> = Vec::new();
    for q in questions {
        let key = or_placeholder(q.section.as_deref(), DEFAULT_SECTION_KEY);
        match keys.iter().position(|k| *k == key) {
            Some(i) => groups[i].questions.push(q),
            None => {
                keys.push(key);
                groups.push(QuestionGroup {
                    name: or_placeholder(q.section_name.as_deref(), GENERAL_SECTION),
                    questions: vec![q],
                });
            }
        }
    }
    for group in &mut groups {
        group
            .questions
            .sort_by_key(|q| (q.order.is_none(), q.order.unwrap_or(0)));
    }
    groups
}

/// Build the project brief: project info, grouped Q&A, optional template,
/// closing caption.
pub fn project_document(
    project: &ProjectRecord,
    questions: &[QuestionRecord],
    template: Option<&TemplateRecord>,
    generated_at: DateTime<Utc>,
) -> DocumentSpec {
    let title = or_placeholder(project.title.as_deref(), UNTITLED_PROJECT);

    let mut spec = DocumentSpec::new(Metadata {
        title: Some("Document Information".to_string()),
        subject: Some(title.clone()),
        keywords: Some("Project, Questions, Template".to_string()),
        created_at: Some(generated_at),
        ..Default::default()
    });

    let info = Section::new("Project Details")
        .block(Block::title(title))
        .block(Block::FieldList {
            items: vec![
                Field::new(
                    "Client",
                    or_placeholder(
                        project.client.as_ref().and_then(|c| c.name.as_deref()),
                        NOT_SPECIFIED,
                    ),
                ),
                Field::new("Category", or_placeholder(project.category.as_deref(), NOT_SPECIFIED)),
                Field::new("Priority", or_placeholder(project.priority.as_deref(), NOT_SPECIFIED)),
                Field::new("Start Date", format_date(project.start_date.as_deref())),
                Field::new("End Date", format_date(project.end_date.as_deref())),
                Field::new("Budget", format_budget(project)),
            ],
        })
        .block(Block::paragraph(or_placeholder(
            project.description.as_deref(),
            NO_DESCRIPTION,
        )));
    spec.sections.push(info);

    for (group_index, group) in group_questions(questions).into_iter().enumerate() {
        let mut section = Section::new(format!("{}. {}", group_index + 1, group.name));
        if group_index > 0 {
            section = section.continued();
        }
        for (i, q) in group.questions.iter().enumerate() {
            section = section.block(Block::QaCard {
                index: i + 1,
                question: or_placeholder(q.question.as_deref(), "Untitled question"),
                answer: q.to_answer(),
            });
        }
        spec.sections.push(section);
    }

    if let Some(template) = template {
        let mut section = Section::new("Template")
            .block(Block::title(or_placeholder(template.title.as_deref(), "Untitled Template")))
            .block(Block::paragraph(or_placeholder(
                template.short_desc.as_deref(),
                NO_DESCRIPTION,
            )))
            .block(Block::ColorSwatch {
                hex_colors: template.colors.clone(),
            });
        if let Some(structure) = template.structure.as_deref().filter(|s| !s.trim().is_empty()) {
            section = section.block(Block::structured_text(structure));
        }
        spec.sections.push(section);
    }

    if let Some(last) = spec.sections.last_mut() {
        last.blocks.push(generated_caption(generated_at));
    }
    spec
}

/// Build the AI analysis report.
pub fn analysis_report(
    project: &ProjectRecord,
    analysis: &AnalysisRecord,
    generated_at: DateTime<Utc>,
) -> DocumentSpec {
    let mut spec = DocumentSpec::new(Metadata {
        title: Some("AI Analysis Report".to_string()),
        author: Some("AI Structor System".to_string()),
        subject: Some(REPORT_TAGLINE.to_string()),
        keywords: Some("AI, Analysis, Project, Structuring".to_string()),
        creator: Some("AI Structor v1.0".to_string()),
        created_at: Some(generated_at),
    });

    spec.sections.push(Section::new("Executive Summary").block(Block::paragraph(
        or_placeholder(
            analysis.executive_summary.as_deref(),
            "No executive summary available from AI analysis.",
        ),
    )));

    let confidence = analysis
        .confidence
        .map(|c| format!("{}%", format_amount(c)))
        .unwrap_or_else(|| "N/A".to_string());
    spec.sections.push(
        Section::new("Project Overview")
            .continued()
            .block(Block::FieldList {
                items: vec![
                    Field::new("Project Title", or_placeholder(project.title.as_deref(), "N/A")),
                    Field::new("Project ID", or_placeholder(project.id.as_deref(), "N/A")),
                    Field::new("AI Analysis Date", generated_at.format("%B %-d, %Y").to_string()),
                    Field::new("Analysis Confidence", confidence),
                    Field::new(
                        "Complexity Level",
                        or_placeholder(analysis.complexity.as_deref(), "N/A"),
                    ),
                ],
            }),
    );

    if !analysis.recommendations.is_empty() {
        let mut section = Section::new("AI Recommendations");
        for (i, rec) in analysis.recommendations.iter().enumerate() {
            section = section.block(Block::QaCard {
                index: i + 1,
                question: or_placeholder(rec.title.as_deref(), "Recommendation"),
                answer: Answer::Text(or_placeholder(rec.description.as_deref(), "No description")),
            });
        }
        spec.sections.push(section);
    }

    if !analysis.risks.is_empty() {
        let mut section = Section::new("Risk Assessment").continued();
        for risk in &analysis.risks {
            section = section.block(Block::Risk {
                severity: or_placeholder(risk.severity.as_deref(), "Unrated"),
                description: or_placeholder(risk.description.as_deref(), "No description"),
                mitigation: risk
                    .mitigation
                    .as_deref()
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string),
            });
        }
        spec.sections.push(section);
    }

    if let Some(req) = analysis
        .technical_requirements
        .as_deref()
        .filter(|r| !r.trim().is_empty())
    {
        spec.sections.push(
            Section::new("Technical Requirements")
                .continued()
                .block(Block::paragraph(req)),
        );
    }

    if let Some(last) = spec.sections.last_mut() {
        last.blocks.push(generated_caption(generated_at));
    }
    spec
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Build the detailed report: a cover page, a contents page listing the
/// analysis sections that follow, then one page per section, each under its
/// own banner.
pub fn detailed_report(
    project: &ProjectRecord,
    full_analysis: Option<&DetailedAnalysisRecord>,
    generated_at: DateTime<Utc>,
) -> DocumentSpec {
    let mut spec = DocumentSpec::new(Metadata {
        title: Some("Detailed AI Structor Report".to_string()),
        author: Some("AI Structor Advanced Analysis".to_string()),
        subject: Some("Comprehensive AI Project Analysis".to_string()),
        keywords: Some("AI, Detailed, Analysis, Report, Project".to_string()),
        creator: Some("AI Structor Pro v2.0".to_string()),
        created_at: Some(generated_at),
    });

    spec.sections.push(
        Section::new("")
            .with_banner("DETAILED AI REPORT")
            .block(Block::title("AI STRUCTOR"))
            .block(Block::title("Advanced Project Analysis"))
            .block(Block::paragraph(format!(
                "{}\n\nGenerated: {}\n\nPowered by Advanced AI Analysis",
                or_placeholder(project.title.as_deref(), "Project Analysis"),
                generated_at.format("%B %-d, %Y %H:%M UTC"),
            ))),
    );

    let mut content: Vec<Section> = Vec::new();
    match full_analysis {
        Some(full) => {
            if let Some(summary) = non_blank(full.executive_summary.as_deref()) {
                content.push(
                    Section::new("Executive Summary")
                        .with_banner("EXECUTIVE SUMMARY")
                        .block(Block::text(summary)),
                );
            }
            if !full.technical_specs.is_empty() {
                let mut section =
                    Section::new("Technical Specifications").with_banner("TECHNICAL SPECIFICATIONS");
                for (i, item) in full.technical_specs.iter().enumerate() {
                    section = section.block(Block::NumberedItem {
                        index: i + 1,
                        title: or_placeholder(item.title.as_deref(), "Specification"),
                        description: Some(or_placeholder(item.description.as_deref(), "No description")),
                    });
                }
                content.push(section);
            }
            if let Some(plan) = non_blank(full.implementation_plan.as_deref()) {
                content.push(
                    Section::new("Implementation Plan")
                        .with_banner("IMPLEMENTATION PLAN")
                        .block(Block::text(plan)),
                );
            }
        }
        None => content.push(
            Section::new("")
                .with_banner("ANALYSIS CONTENT")
                .block(Block::text("Detailed analysis content would appear here..."))
                .block(Block::caption("This is a template for detailed AI analysis reports.")),
        ),
    }

    let entries: Vec<String> = content
        .iter()
        .enumerate()
        .map(|(i, section)| {
            let name = if section.title.is_empty() {
                "Analysis Content"
            } else {
                section.title.as_str()
            };
            format!("{}. {}", i + 1, name)
        })
        .collect();
    spec.sections.push(
        Section::new("Table of Contents")
            .with_banner("DETAILED ANALYSIS")
            .block(Block::text(entries.join("\n"))),
    );
    spec.sections.extend(content);
    spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerKind;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 10, 30, 0).unwrap()
    }

    fn question(text: &str, answer: Value, section: Option<&str>, kind: Option<&str>) -> QuestionRecord {
        QuestionRecord {
            question: Some(text.to_string()),
            answer: Some(answer),
            section: section.map(str::to_string),
            section_name: section.map(|s| s.to_uppercase()),
            kind: kind.map(str::to_string),
            order: None,
        }
    }

    #[test]
    fn empty_project_gets_placeholders() {
        let spec = project_document(&ProjectRecord::default(), &[], None, at());
        assert_eq!(spec.sections.len(), 1);
        let blocks = &spec.sections[0].blocks;
        assert_eq!(blocks[0], Block::title(UNTITLED_PROJECT));
        match &blocks[1] {
            Block::FieldList { items } => {
                assert_eq!(items.len(), 6);
                assert_eq!(items[0].value, NOT_SPECIFIED);
                assert_eq!(items[5], Field::new("Budget", "0 MAD"));
            }
            other => panic!("expected field list, got {:?}", other),
        }
        assert_eq!(blocks[2], Block::paragraph(NO_DESCRIPTION));
        assert!(matches!(blocks.last(), Some(Block::Caption { .. })));
    }

    #[test]
    fn dates_and_budget_are_formatted() {
        let project = ProjectRecord {
            start_date: Some("2024-01-15T00:00:00.000Z".into()),
            end_date: Some("2024-06-30".into()),
            budget: Some(12500.0),
            currency: Some("EUR".into()),
            ..Default::default()
        };
        let spec = project_document(&project, &[], None, at());
        let Block::FieldList { items } = &spec.sections[0].blocks[1] else {
            panic!("expected field list");
        };
        assert_eq!(items[3].value, "January 15, 2024");
        assert_eq!(items[4].value, "June 30, 2024");
        assert_eq!(items[5].value, "12500 EUR");
    }

    #[test]
    fn questions_group_by_section_in_first_appearance_order() {
        let questions = vec![
            question("Audience?", Value::from("Parents"), Some("goals"), None),
            question("Primary color?", Value::from("#ff0000, #00ff00"), Some("branding"), Some("color")),
            question("Deadline?", Value::Null, Some("goals"), None),
            question("Anything else?", Value::from(42), None, None),
        ];
        let spec = project_document(&ProjectRecord::default(), &questions, None, at());
        let titles: Vec<&str> = spec.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Project Details", "1. GOALS", "2. BRANDING", "3. General Information"]
        );
        assert!(spec.sections[1].start_on_new_page);
        assert!(!spec.sections[2].start_on_new_page);

        match &spec.sections[1].blocks[1] {
            Block::QaCard { index, answer, .. } => {
                assert_eq!(*index, 2);
                assert_eq!(*answer, Answer::Text(NOT_ANSWERED.into()));
            }
            other => panic!("expected card, got {:?}", other),
        }
        match &spec.sections[2].blocks[0] {
            Block::QaCard { answer, .. } => {
                assert_eq!(answer.kind(), AnswerKind::ColorSwatchList);
                assert_eq!(*answer, Answer::colors_from_csv("#ff0000,#00ff00"));
            }
            other => panic!("expected card, got {:?}", other),
        }
        match &spec.sections[3].blocks[0] {
            Block::QaCard { answer, .. } => assert_eq!(*answer, Answer::Text("42".into())),
            other => panic!("expected card, got {:?}", other),
        }
    }

    #[test]
    fn groups_are_sorted_by_order() {
        let mut a = question("second", Value::from("b"), Some("s"), None);
        a.order = Some(2);
        let mut b = question("first", Value::from("a"), Some("s"), None);
        b.order = Some(1);
        let c = question("unordered", Value::from("c"), Some("s"), None);
        let spec = project_document(&ProjectRecord::default(), &[c, a, b], None, at());
        let questions: Vec<&str> = spec.sections[1]
            .blocks
            .iter()
            .filter_map(|b| match b {
                Block::QaCard { question, .. } => Some(question.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(questions, vec!["first", "second", "unordered"]);
    }

    #[test]
    fn template_section_carries_swatches_and_structure() {
        let template = TemplateRecord {
            title: Some("Landing".into()),
            short_desc: None,
            structure: Some("TEMPLATE 1 (PAGE 1: HOME)\nheader:\n- logo".into()),
            colors: vec!["#131313".into()],
        };
        let spec = project_document(&ProjectRecord::default(), &[], Some(&template), at());
        let section = spec.sections.last().unwrap();
        assert_eq!(section.title, "Template");
        assert!(matches!(&section.blocks[2], Block::ColorSwatch { hex_colors } if hex_colors.len() == 1));
        assert!(matches!(&section.blocks[3], Block::RawStructuredText { lines } if lines.len() == 3));
        assert!(matches!(section.blocks.last(), Some(Block::Caption { .. })));
    }

    #[test]
    fn array_answers_join_with_commas() {
        let q = question("Colors", serde_json::json!(["#fff", "#000"]), None, Some("brand-colors"));
        assert_eq!(q.answer_text().as_deref(), Some("#fff, #000"));
        assert!(q.is_color_question());
    }

    #[test]
    fn detailed_report_gives_each_section_its_banner() {
        let full = DetailedAnalysisRecord {
            executive_summary: Some("A bakery site with online cake orders.".into()),
            technical_specs: vec![
                TechnicalSpec {
                    title: Some("Payments".into()),
                    description: Some("Card payments through CMI.".into()),
                },
                TechnicalSpec::default(),
            ],
            implementation_plan: Some("Discovery, build, launch.".into()),
        };
        let project = ProjectRecord {
            title: Some("Acme Site".into()),
            ..Default::default()
        };
        let spec = detailed_report(&project, Some(&full), at());
        let banners: Vec<&str> = spec
            .sections
            .iter()
            .map(|s| s.banner_title.as_deref().unwrap_or(""))
            .collect();
        assert_eq!(
            banners,
            vec![
                "DETAILED AI REPORT",
                "DETAILED ANALYSIS",
                "EXECUTIVE SUMMARY",
                "TECHNICAL SPECIFICATIONS",
                "IMPLEMENTATION PLAN"
            ]
        );
        assert!(spec.sections.iter().all(|s| s.start_on_new_page));
        assert!(matches!(
            &spec.sections[1].blocks[0],
            Block::Text { text }
                if text == "1. Executive Summary\n2. Technical Specifications\n3. Implementation Plan"
        ));
        assert!(matches!(
            &spec.sections[3].blocks[1],
            Block::NumberedItem { index: 2, title, description: Some(d) }
                if title == "Specification" && d == "No description"
        ));
        assert!(matches!(
            &spec.sections[0].blocks[2],
            Block::Paragraph { text } if text.starts_with("Acme Site")
        ));
        assert_eq!(spec.metadata.creator.as_deref(), Some("AI Structor Pro v2.0"));
    }

    #[test]
    fn detailed_report_without_analysis_is_a_template() {
        let spec = detailed_report(&ProjectRecord::default(), None, at());
        assert_eq!(spec.sections.len(), 3);
        assert_eq!(spec.sections[2].banner_title.as_deref(), Some("ANALYSIS CONTENT"));
        assert!(matches!(
            &spec.sections[1].blocks[0],
            Block::Text { text } if text == "1. Analysis Content"
        ));
        assert!(matches!(
            &spec.sections[0].blocks[2],
            Block::Paragraph { text } if text.starts_with("Project Analysis")
        ));
    }

    #[test]
    fn detailed_bundle_reads_full_analysis_key() {
        let bundle: DetailedReportBundle = serde_json::from_value(serde_json::json!({
            "project": { "title": "Acme Site" },
            "fullAnalysis": {
                "executiveSummary": "Summary",
                "technicalSpecs": [{ "title": "Hosting" }]
            }
        }))
        .unwrap();
        let full = bundle.full_analysis.as_ref().unwrap();
        assert_eq!(full.technical_specs.len(), 1);
        assert!(full.implementation_plan.is_none());
        assert_eq!(bundle.to_document(at()).sections.len(), 4);
    }

    #[test]
    fn analysis_report_sections() {
        let analysis = AnalysisRecord {
            confidence: Some(87.0),
            recommendations: vec![Recommendation {
                title: Some("Use a CDN".into()),
                description: None,
            }],
            risks: vec![Risk {
                description: Some("Scope creep".into()),
                severity: Some("High".into()),
                mitigation: Some("Weekly reviews".into()),
            }],
            technical_requirements: Some("Rust 1.75".into()),
            ..Default::default()
        };
        let spec = analysis_report(&ProjectRecord::default(), &analysis, at());
        let titles: Vec<&str> = spec.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Executive Summary",
                "Project Overview",
                "AI Recommendations",
                "Risk Assessment",
                "Technical Requirements"
            ]
        );
        let Block::FieldList { items } = &spec.sections[1].blocks[0] else {
            panic!("expected overview fields");
        };
        assert_eq!(items[3].value, "87%");
        assert!(matches!(
            &spec.sections[3].blocks[0],
            Block::Risk { severity, description, mitigation: Some(m) }
                if severity == "High" && description == "Scope creep" && m == "Weekly reviews"
        ));
        assert_eq!(spec.metadata.creator.as_deref(), Some("AI Structor v1.0"));
    }
}
