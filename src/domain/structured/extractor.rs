//! Extraction of a JSON payload from free-form model output.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("Response was empty")]
    Empty,

    #[error("No JSON payload found in response")]
    NoJson,
}

/// Pulls the JSON payload out of a response that may be wrapped in markdown
/// fences or surrounded by prose.
///
/// Tried in order:
/// 1. the response itself, when it starts with a balanced object or array
/// 2. a ```json fenced block
/// 3. any ``` fenced block
/// 4. the first balanced object or array anywhere in the text
/// 5. everything from the first `{` to the last `}`
pub fn extract_json(response: &str) -> Result<String, ExtractionError> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Err(ExtractionError::Empty);
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Some(json) = extract_balanced(trimmed, 0) {
            return Ok(json);
        }
    }

    if let Some(json) = extract_from_code_block(trimmed) {
        return Ok(json);
    }

    let obj_start = trimmed.find('{');
    let arr_start = trimmed.find('[');
    let start = match (obj_start, arr_start) {
        (Some(o), Some(a)) => Some(o.min(a)),
        (o, a) => o.or(a),
    };
    if let Some(start) = start {
        if let Some(json) = extract_balanced(trimmed, start) {
            return Ok(json);
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(trimmed[start..=end].to_string()),
        _ => Err(ExtractionError::NoJson),
    }
}

fn extract_from_code_block(s: &str) -> Option<String> {
    let body_start = if let Some(idx) = s.find("```json") {
        idx + "```json".len()
    } else {
        let idx = s.find("```")?;
        // Skip an optional language tag on the fence line.
        let after = idx + 3;
        match s[after..].find('\n') {
            Some(newline) => after + newline + 1,
            None => after,
        }
    };
    let end = s[body_start..].find("```")?;
    let body = s[body_start..body_start + end].trim();
    if body.is_empty() {
        None
    } else {
        Some(body.to_string())
    }
}

/// Returns the balanced object/array starting at byte offset `start`.
fn extract_balanced(s: &str, start: usize) -> Option<String> {
    let open = s[start..].chars().next()?;
    let close = match open {
        '{' => '}',
        '[' => ']',
        _ => return None,
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, c) in s[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            c if c == open => depth += 1,
            c if c == close => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let end = start + offset + c.len_utf8();
                    return Some(s[start..end].to_string());
                }
            }
            _ => {}
        }
    }
    None
}
