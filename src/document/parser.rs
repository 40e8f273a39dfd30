//! Course document parsing.
//!
//! Expected layout:
//!
//! ```text
//! Course Title: Building Towards Computer Use
//! Course Link: https://example.com/course
//! Course Instructor: Colt Steele
//!
//! Lesson 0: Introduction
//! Lesson Link: https://example.com/lesson0
//! <lesson body...>
//!
//! Lesson 1: ...
//! ```
//!
//! Only the title line is mandatory. Text between the header and the first
//! lesson marker belongs to the course but to no lesson.

use super::{Course, Lesson};
use crate::error::{PensumError, Result};
use regex::Regex;

const TITLE_PREFIX: &str = "Course Title:";
const LINK_PREFIX: &str = "Course Link:";
const INSTRUCTOR_PREFIX: &str = "Course Instructor:";
const LESSON_LINK_PREFIX: &str = "Lesson Link:";

/// A parsed document: course metadata plus any text preceding the first
/// lesson marker.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub course: Course,
    /// Course-level text with no owning lesson.
    pub preamble: Option<String>,
}

/// Parse a course transcript document.
///
/// Fails with [`PensumError::MalformedDocument`] if the title line is absent.
pub fn parse_course_document(text: &str) -> Result<ParsedDocument> {
    let lesson_marker =
        Regex::new(r"^Lesson\s+(\d+):\s*(.*)$").expect("lesson marker regex is valid");

    let mut title = None;
    let mut link = None;
    let mut instructor = None;

    let mut lessons: Vec<Lesson> = Vec::new();
    let mut preamble_lines: Vec<&str> = Vec::new();
    let mut current_body: Vec<&str> = Vec::new();
    let mut current_lesson: Option<Lesson> = None;

    for line in text.lines() {
        let trimmed = line.trim();

        // Header metadata can only appear before the first lesson marker.
        if current_lesson.is_none() && lessons.is_empty() {
            if let Some(value) = trimmed.strip_prefix(TITLE_PREFIX) {
                title = Some(value.trim().to_string());
                continue;
            }
            if let Some(value) = trimmed.strip_prefix(LINK_PREFIX) {
                link = non_empty(value);
                continue;
            }
            if let Some(value) = trimmed.strip_prefix(INSTRUCTOR_PREFIX) {
                instructor = non_empty(value);
                continue;
            }
        }

        if let Some(captures) = lesson_marker.captures(trimmed) {
            flush_lesson(&mut lessons, &mut current_lesson, &mut current_body);

            let number: u32 = captures[1].parse().map_err(|_| {
                PensumError::MalformedDocument(format!("invalid lesson number in '{}'", trimmed))
            })?;
            current_lesson = Some(Lesson {
                number,
                title: captures[2].trim().to_string(),
                link: None,
                body: String::new(),
            });
            continue;
        }

        // A lesson link line directly under a marker attaches to that lesson.
        if let Some(value) = trimmed.strip_prefix(LESSON_LINK_PREFIX) {
            if let Some(lesson) = current_lesson.as_mut() {
                if lesson.link.is_none() && current_body.iter().all(|l| l.trim().is_empty()) {
                    lesson.link = non_empty(value);
                    continue;
                }
            }
        }

        if current_lesson.is_some() {
            current_body.push(line);
        } else {
            preamble_lines.push(line);
        }
    }

    flush_lesson(&mut lessons, &mut current_lesson, &mut current_body);

    let title = title.ok_or_else(|| {
        PensumError::MalformedDocument(format!("missing '{}' line", TITLE_PREFIX))
    })?;
    if title.is_empty() {
        return Err(PensumError::MalformedDocument(format!(
            "empty '{}' line",
            TITLE_PREFIX
        )));
    }

    let preamble = non_empty(&preamble_lines.join("\n"));

    Ok(ParsedDocument {
        course: Course {
            title,
            link,
            instructor,
            lessons,
        },
        preamble,
    })
}

fn flush_lesson(lessons: &mut Vec<Lesson>, current: &mut Option<Lesson>, body: &mut Vec<&str>) {
    if let Some(mut lesson) = current.take() {
        lesson.body = body.join("\n").trim().to_string();
        lessons.push(lesson);
    }
    body.clear();
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
