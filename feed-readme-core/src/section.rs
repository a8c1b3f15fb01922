//! Section markers and the pure splice that replaces a section body.
//!
//! A section named `feed` is delimited by
//!
//! ```text
//! <!--START_SECTION:feed-->
//! ...body...
//! <!--END_SECTION:feed-->
//! ```
//!
//! The `-->` terminator keeps markers for different names (e.g. `feed` and
//! `feeds`) from matching each other.

use tracing::{debug, error};

use crate::error::SectionError;

/// The start/end sentinel pair for one section name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMarkers {
    pub start: String,
    pub end: String,
}

impl SectionMarkers {
    /// Derive the markers for `section`. Names containing `-->` would close the
    /// comment early and are rejected.
    pub fn for_section(section: &str) -> Result<Self, SectionError> {
        if section.contains("-->") {
            return Err(SectionError::InvalidName(section.to_string()));
        }
        Ok(Self {
            start: format!("<!--START_SECTION:{section}-->"),
            end: format!("<!--END_SECTION:{section}-->"),
        })
    }

    /// Byte range strictly between the markers: `(body_start, body_end)`.
    fn locate(&self, section: &str, text: &str) -> Result<(usize, usize), SectionError> {
        let starts: Vec<usize> = text.match_indices(&self.start).map(|(i, _)| i).collect();
        let ends: Vec<usize> = text.match_indices(&self.end).map(|(i, _)| i).collect();

        if starts.len() != 1 || ends.len() != 1 {
            error!(
                section,
                starts = starts.len(),
                ends = ends.len(),
                "Section markers missing or duplicated"
            );
            return Err(SectionError::NotFound {
                section: section.to_string(),
                starts: starts.len(),
                ends: ends.len(),
            });
        }

        let body_start = starts[0] + self.start.len();
        let body_end = ends[0];
        if body_end < body_start {
            error!(section, "End marker found before start marker");
            return Err(SectionError::Misordered {
                section: section.to_string(),
            });
        }
        Ok((body_start, body_end))
    }
}

/// Replace everything strictly between the markers of `section` with
/// `\n{replacement}\n`, leaving the markers and the rest of the document untouched.
/// A section whose body uses `\r\n` line breaks keeps `\r\n` framing.
///
/// When `replacement` equals the body [`extract_section`] returns, the input is
/// returned unchanged, whatever framing the body had.
pub fn replace_section(
    text: &str,
    section: &str,
    replacement: &str,
) -> Result<String, SectionError> {
    let markers = SectionMarkers::for_section(section)?;
    let (body_start, body_end) = markers.locate(section, text)?;
    let old = Framed::split(&text[body_start..body_end]);

    if old.content == replacement {
        debug!(section, "Section body unchanged");
        return Ok(text.to_string());
    }

    let newline = old.newline();
    let mut out = String::with_capacity(text.len() + replacement.len() + 2 * newline.len());
    out.push_str(&text[..body_start]);
    out.push_str(newline);
    out.push_str(replacement);
    out.push_str(newline);
    out.push_str(&text[body_end..]);

    debug!(
        section,
        old_body_len = body_end - body_start,
        new_body_len = replacement.len(),
        "Replaced section body"
    );
    Ok(out)
}

/// Current body of `section`, without the framing line break on each side.
pub fn extract_section<'t>(text: &'t str, section: &str) -> Result<&'t str, SectionError> {
    let markers = SectionMarkers::for_section(section)?;
    let (body_start, body_end) = markers.locate(section, text)?;
    Ok(Framed::split(&text[body_start..body_end]).content)
}

/// A section body split into its framing line breaks and content.
///
/// The trailing break is only stripped when it matches the leading one, so a
/// body written as `\n{content}\n` always splits back into `content`, even
/// when `content` ends in `\r`.
struct Framed<'t> {
    lead: &'t str,
    content: &'t str,
    trail: &'t str,
}

impl<'t> Framed<'t> {
    fn split(body: &'t str) -> Self {
        let lead = if body.starts_with("\r\n") {
            "\r\n"
        } else if body.starts_with('\n') {
            "\n"
        } else {
            ""
        };
        let rest = &body[lead.len()..];

        let trail = match lead {
            "" if rest.ends_with("\r\n") => "\r\n",
            "" if rest.ends_with('\n') => "\n",
            "" => "",
            _ if rest.ends_with(lead) => lead,
            _ => "",
        };

        Self {
            lead,
            content: &rest[..rest.len() - trail.len()],
            trail,
        }
    }

    fn newline(&self) -> &'static str {
        if self.lead == "\r\n" || (self.lead.is_empty() && self.trail == "\r\n") {
            "\r\n"
        } else {
            "\n"
        }
    }
}
