//! Live-progress aggregation: pure projection of exam-progress records into
//! render-ready session views. No store access and no error path — a missing
//! nested field defaults to zero/empty instead of failing the whole view.

use chrono::{DateTime, Duration, Utc};

use crate::models::progress::{
    ExamProgress, ModuleCatalog, ModuleRow, ModuleState, SessionProjection,
};
use crate::models::stats::LiveSession;

/// Sessions not updated within this window stop counting as live even while
/// still flagged active, so abandoned sessions drop off the activity list.
const RECENT_ACTIVITY_WINDOW_MINUTES: i64 = 10;

const LIVE_STATUSES: [&str; 2] = ["active", "in-progress"];

/// Placeholder for absent display fields.
const MISSING: &str = "--";

/// The active module set for a record: its own enabledModules verbatim when
/// present, otherwise the canonical order filtered to keys the record has
/// progress flags for.
pub fn active_modules(record: &ExamProgress, catalog: &ModuleCatalog) -> Vec<String> {
    if let Some(enabled) = &record.enabled_modules {
        return enabled.clone();
    }
    catalog
        .order()
        .iter()
        .filter(|key| record.module_progress.contains_key(key.as_str()))
        .cloned()
        .collect()
}

/// Project one progress record into its dashboard view.
pub fn project_session(record: &ExamProgress, catalog: &ModuleCatalog) -> SessionProjection {
    let enabled = active_modules(record, catalog);
    let enabled_count = enabled.len() as u32;
    let completed_count = enabled
        .iter()
        .filter(|key| record.module_progress.get(key.as_str()).copied().unwrap_or(false))
        .count() as u32;

    // A precomputed percent on the record wins outright; there is no
    // reconciliation against the derived value.
    let overall_percentage = match record.overall_progress {
        Some(value) => value.round() as u32,
        None => percent(completed_count as f64, enabled_count as f64),
    };

    let current_key = record
        .current_question
        .as_ref()
        .and_then(|question| question.module.as_deref());

    let mut modules = Vec::with_capacity(enabled.len());
    let mut total_score = 0.0f64;
    let mut total_max = 0u32;

    for key in &enabled {
        let questions = record
            .test_modules
            .get(key)
            .map(|spec| spec.questions.as_slice())
            .unwrap_or(&[]);
        let max_marks = catalog.kind(key).max_marks(questions);

        let completed = record.module_progress.get(key).copied().unwrap_or(false);
        let state = if completed {
            ModuleState::Completed
        } else if current_key == Some(key.as_str()) {
            ModuleState::Current
        } else {
            ModuleState::Pending
        };

        let raw_score = record.module_scores.get(key).copied();
        total_score += raw_score.unwrap_or(0.0);
        total_max += max_marks;

        // Scores surface only once the module is done; a partial score on a
        // current/pending module stays hidden (but still counts in totals).
        let shown_score = if completed {
            Some(raw_score.unwrap_or(0.0))
        } else {
            None
        };
        let percentage = shown_score.map(|score| percent(score, max_marks as f64));
        let score_display = match shown_score {
            Some(score) => format!("{}/{}", format_score(score), max_marks),
            None => format!("{}/{}", MISSING, max_marks),
        };

        modules.push(ModuleRow {
            key: key.clone(),
            state,
            score: shown_score,
            max_marks,
            percentage,
            score_display,
        });
    }

    let total_percentage = percent(total_score, total_max as f64);

    SessionProjection {
        student_name: display_field(&record.student_name),
        student_email: display_field(&record.student_email),
        test_title: display_field(&record.test_title),
        status: display_field(&record.status),
        started_at: record.started_at,
        last_updated: record.last_updated,
        enabled_count,
        completed_count,
        overall_percentage,
        modules,
        total_score,
        total_max,
        total_percentage,
    }
}

/// A session counts as live only while flagged active AND updated inside the
/// recency window; either condition failing excludes it.
pub fn is_recent_active(record: &ExamProgress, now: DateTime<Utc>) -> bool {
    let live_status = record
        .status
        .as_deref()
        .map(|status| LIVE_STATUSES.contains(&status.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    if !live_status {
        return false;
    }
    match record.last_updated {
        Some(updated) => {
            now.signed_duration_since(updated)
                <= Duration::minutes(RECENT_ACTIVITY_WINDOW_MINUTES)
        }
        None => false,
    }
}

/// Recent-activity rows, newest update first.
pub fn recent_sessions(
    records: &[ExamProgress],
    catalog: &ModuleCatalog,
    now: DateTime<Utc>,
) -> Vec<LiveSession> {
    let mut sessions: Vec<LiveSession> = records
        .iter()
        .filter(|record| is_recent_active(record, now))
        .map(|record| {
            let projection = project_session(record, catalog);
            LiveSession {
                student_name: projection.student_name,
                student_email: projection.student_email,
                test_title: projection.test_title,
                status: projection.status,
                last_updated: projection.last_updated,
                overall_percentage: projection.overall_percentage,
            }
        })
        .collect();
    sessions.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
    sessions
}

fn percent(part: f64, whole: f64) -> u32 {
    if whole <= 0.0 {
        0
    } else {
        (100.0 * part / whole).round() as u32
    }
}

fn display_field(value: &Option<String>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.clone(),
        _ => MISSING.to_string(),
    }
}

fn format_score(score: f64) -> String {
    if score.fract().abs() < f64::EPSILON {
        format!("{}", score as i64)
    } else {
        format!("{:.1}", score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::progress::{CurrentQuestion, ModuleSpec};
    use mongodb::bson::{doc, Bson};
    use std::collections::HashMap;

    fn catalog() -> ModuleCatalog {
        ModuleCatalog::default()
    }

    fn questions(count: i32) -> ModuleSpec {
        ModuleSpec {
            questions: (0..count).map(Bson::Int32).collect(),
        }
    }

    #[test]
    fn enabled_modules_list_wins_verbatim() {
        let record = ExamProgress {
            enabled_modules: Some(vec![
                "voiceAssessment".to_string(),
                "aptitude".to_string(),
            ]),
            module_progress: HashMap::from([
                ("grammarMCQ".to_string(), true),
                ("listeningComprehension".to_string(), false),
            ]),
            ..Default::default()
        };
        assert_eq!(
            active_modules(&record, &catalog()),
            vec!["voiceAssessment", "aptitude"]
        );
    }

    #[test]
    fn missing_enabled_modules_falls_back_to_canonical_order() {
        let record = ExamProgress {
            module_progress: HashMap::from([
                ("aptitude".to_string(), true),
                ("grammarMCQ".to_string(), false),
                ("unknownModule".to_string(), true),
            ]),
            ..Default::default()
        };
        // canonical order, filtered to keys present in moduleProgress;
        // keys outside the catalog are dropped
        assert_eq!(
            active_modules(&record, &catalog()),
            vec!["grammarMCQ", "aptitude"]
        );
    }

    #[test]
    fn derived_percentage_rounds_and_handles_empty() {
        let record = ExamProgress {
            enabled_modules: Some(vec![
                "grammarMCQ".to_string(),
                "aptitude".to_string(),
                "vocabularyMCQ".to_string(),
            ]),
            module_progress: HashMap::from([
                ("grammarMCQ".to_string(), true),
                ("aptitude".to_string(), true),
            ]),
            ..Default::default()
        };
        let projection = project_session(&record, &catalog());
        assert_eq!(projection.overall_percentage, 67); // round(200/3)

        let empty = ExamProgress {
            enabled_modules: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(project_session(&empty, &catalog()).overall_percentage, 0);
    }

    #[test]
    fn precomputed_percentage_wins_without_reconciliation() {
        let record = ExamProgress {
            enabled_modules: Some(vec!["grammarMCQ".to_string(), "aptitude".to_string()]),
            module_progress: HashMap::from([("grammarMCQ".to_string(), true)]),
            overall_progress: Some(88.0),
            ..Default::default()
        };
        // derived value would be 50
        assert_eq!(project_session(&record, &catalog()).overall_percentage, 88);
    }

    #[test]
    fn listening_max_marks_differ_from_question_count() {
        let listening = ModuleSpec {
            questions: vec![
                Bson::Document(doc! { "subAnswers": [1, 2, 3] }),
                Bson::Document(doc! { "subAnswers": [4, 5] }),
            ],
        };
        let record = ExamProgress {
            enabled_modules: Some(vec![
                "listeningComprehension".to_string(),
                "grammarMCQ".to_string(),
            ]),
            test_modules: HashMap::from([
                ("listeningComprehension".to_string(), listening),
                ("grammarMCQ".to_string(), questions(2)),
            ]),
            ..Default::default()
        };
        let projection = project_session(&record, &catalog());
        assert_eq!(projection.modules[0].max_marks, 5);
        assert_eq!(projection.modules[1].max_marks, 2);
        assert_eq!(projection.total_max, 7);
    }

    #[test]
    fn current_module_is_highlighted_but_completed_wins() {
        let record = ExamProgress {
            enabled_modules: Some(vec![
                "grammarMCQ".to_string(),
                "aptitude".to_string(),
                "vocabularyMCQ".to_string(),
            ]),
            module_progress: HashMap::from([("grammarMCQ".to_string(), true)]),
            current_question: Some(CurrentQuestion {
                module: Some("aptitude".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let projection = project_session(&record, &catalog());
        assert_eq!(projection.modules[0].state, ModuleState::Completed);
        assert_eq!(projection.modules[1].state, ModuleState::Current);
        assert_eq!(projection.modules[2].state, ModuleState::Pending);
    }

    #[test]
    fn totals_treat_missing_scores_as_zero() {
        let record = ExamProgress {
            enabled_modules: Some(vec![
                "grammarMCQ".to_string(),
                "aptitude".to_string(),
            ]),
            module_progress: HashMap::from([
                ("grammarMCQ".to_string(), true),
                ("aptitude".to_string(), true),
            ]),
            module_scores: HashMap::from([("grammarMCQ".to_string(), 3.0)]),
            test_modules: HashMap::from([
                ("grammarMCQ".to_string(), questions(4)),
                ("aptitude".to_string(), questions(6)),
            ]),
            ..Default::default()
        };
        let projection = project_session(&record, &catalog());
        assert_eq!(projection.total_score, 3.0);
        assert_eq!(projection.total_max, 10);
        assert_eq!(projection.total_percentage, 30);
        // completed module without a score shows 0, not a hole
        assert_eq!(projection.modules[1].score, Some(0.0));
        assert_eq!(projection.modules[1].score_display, "0/6");
    }

    #[test]
    fn recent_filter_excludes_stale_and_non_active() {
        let now = Utc::now();
        let fresh = ExamProgress {
            status: Some("active".to_string()),
            last_updated: Some(now - Duration::minutes(9)),
            ..Default::default()
        };
        let stale = ExamProgress {
            status: Some("active".to_string()),
            last_updated: Some(now - Duration::minutes(11)),
            ..Default::default()
        };
        let finished = ExamProgress {
            status: Some("completed".to_string()),
            last_updated: Some(now - Duration::minutes(1)),
            ..Default::default()
        };
        let undated = ExamProgress {
            status: Some("in-progress".to_string()),
            ..Default::default()
        };

        assert!(is_recent_active(&fresh, now));
        assert!(!is_recent_active(&stale, now));
        assert!(!is_recent_active(&finished, now));
        assert!(!is_recent_active(&undated, now));

        let rows = recent_sessions(
            &[stale, fresh, finished, undated],
            &catalog(),
            now,
        );
        assert_eq!(rows.len(), 1);
    }

    // End-to-end fixture from the dashboard contract: 1 of 2 modules done,
    // aptitude 5/5, grammarMCQ pending --/2, totals 5/7 -> 71%.
    #[test]
    fn full_projection_fixture() {
        let record = ExamProgress {
            student_name: Some("Asha Rao".to_string()),
            enabled_modules: Some(vec!["aptitude".to_string(), "grammarMCQ".to_string()]),
            module_progress: HashMap::from([("aptitude".to_string(), true)]),
            module_scores: HashMap::from([("aptitude".to_string(), 5.0)]),
            test_modules: HashMap::from([
                ("aptitude".to_string(), questions(5)),
                ("grammarMCQ".to_string(), questions(2)),
            ]),
            ..Default::default()
        };

        let projection = project_session(&record, &catalog());

        assert_eq!(projection.student_name, "Asha Rao");
        assert_eq!(projection.student_email, "--");
        assert_eq!(projection.enabled_count, 2);
        assert_eq!(projection.completed_count, 1);
        assert_eq!(projection.overall_percentage, 50);

        let aptitude = &projection.modules[0];
        assert_eq!(aptitude.state, ModuleState::Completed);
        assert_eq!(aptitude.score, Some(5.0));
        assert_eq!(aptitude.max_marks, 5);
        assert_eq!(aptitude.percentage, Some(100));
        assert_eq!(aptitude.score_display, "5/5");

        let grammar = &projection.modules[1];
        assert_eq!(grammar.state, ModuleState::Pending);
        assert_eq!(grammar.score, None);
        assert_eq!(grammar.max_marks, 2);
        assert_eq!(grammar.percentage, None);
        assert_eq!(grammar.score_display, "--/2");

        assert_eq!(projection.total_score, 5.0);
        assert_eq!(projection.total_max, 7);
        assert_eq!(projection.total_percentage, 71);
    }
}
