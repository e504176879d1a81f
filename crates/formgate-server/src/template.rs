//! Logic-less template rendering
//!
//! Form templates carry `{{actionUrl}}` and `{{submissionData}}`
//! placeholders that are substituted textually at render time. There is no
//! conditional logic, no nesting and no escaping; unknown placeholders are
//! left in the output verbatim.

/// Named substitution parameters for form rendering
#[derive(Debug, Clone)]
pub struct RenderParams {
    /// Submission callback URL injected into the form action
    pub action_url: String,
    /// JSON string of the request's submission identifiers
    pub submission_data: String,
}

/// Substitute the named placeholders in a template body
pub fn render(template: &str, params: &RenderParams) -> String {
    let mut output = String::with_capacity(template.len() + 64);
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        match after_open.find("}}") {
            Some(end) => {
                let placeholder = after_open[..end].trim();
                match placeholder {
                    "actionUrl" => output.push_str(&params.action_url),
                    "submissionData" => output.push_str(&params.submission_data),
                    _ => {
                        // Unknown placeholder, keep verbatim
                        output.push_str(&rest[start..start + 2 + end + 2]);
                    }
                }
                rest = &after_open[end + 2..];
            }
            None => {
                // Unterminated braces, keep the remainder as-is
                output.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> RenderParams {
        RenderParams {
            action_url: "http://localhost:3000/forms/retail/kyc/submit?flow_id=f1".to_string(),
            submission_data: r#"{"session_id":"s1"}"#.to_string(),
        }
    }

    #[test]
    fn substitutes_both_placeholders() {
        let html = r#"<form action="{{actionUrl}}"><script>var data = {{submissionData}};</script></form>"#;
        let rendered = render(html, &params());

        assert!(rendered.contains("action=\"http://localhost:3000/forms/retail/kyc/submit?flow_id=f1\""));
        assert!(rendered.contains(r#"var data = {"session_id":"s1"};"#));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn tolerates_whitespace_inside_braces() {
        let rendered = render("{{ actionUrl }}", &params());
        assert_eq!(rendered, params().action_url);
    }

    #[test]
    fn leaves_unknown_placeholders_verbatim() {
        let rendered = render("<p>{{something}}</p>", &params());
        assert_eq!(rendered, "<p>{{something}}</p>");
    }

    #[test]
    fn leaves_unterminated_braces_verbatim() {
        let rendered = render("<p>{{actionUrl</p>", &params());
        assert_eq!(rendered, "<p>{{actionUrl</p>");
    }

    #[test]
    fn repeated_placeholders_are_all_substituted() {
        let rendered = render("{{actionUrl}} and {{actionUrl}}", &params());
        assert_eq!(
            rendered,
            format!("{} and {}", params().action_url, params().action_url)
        );
    }
}
