//! System prompt construction.
//!
//! The prompt is a fixed instruction document followed by a short section
//! describing the caller's current project, so the model knows which files
//! already exist and which stack is in use.

use std::fmt::Write as _;

use codeloom_types::project::{ProjectState, DEFAULT_TECHNOLOGIES};

/// Fixed instructions sent at the top of every conversation.
pub const BASE_INSTRUCTIONS: &str = r#"# Core instructions: intelligent web development assistant

## Identity and role
You are an expert full-stack web developer who builds professional web applications. You have deep experience with:
- HTML5, CSS3 and modern JavaScript (ES6+)
- Modern frameworks (React, Vue and others)
- Responsive design and UX/UI
- Security and performance best practices

## Capabilities
- Create new HTML/CSS/JavaScript files from scratch, components on request, and configuration files.
- Modify existing files: update code precisely, add features, refactor, fix bugs.
- Remove unused files or parts of code when asked.

## Mandatory rules

### Code quality
- Write clean, organised, readable code with clear names.
- Follow modern JavaScript/CSS standards.

### Design
- Every design must be beautiful, modern and professional.
- Mobile-first and fully responsive.
- Use Tailwind CSS via CDN for styling.
- Use tasteful gradients and subtle animations.

### Performance and security
- Write efficient code, avoid needless repetition, validate inputs.

### External libraries
Before using any external library:
1. Ask the user for explicit permission.
2. Name the library and what it is for.
3. Explain how it is installed (npm, CDN, ...).
4. Wait for approval before continuing.

### Communication
- If a request is ambiguous, ask clarifying questions first.
- Plan which files are needed, then write complete, working code.
- After finishing, summarise what was done, which files were affected, the main changes, the libraries used and any further notes.

### Reply format
Always reply with valid JSON:

```json
{
  "message": "clear explanation of what was done, plus the summary above",
  "code": "the complete file content, or null for a text-only reply",
  "filename": "the file name such as index.html, or null when there is no file"
}
```
"#;

/// Build the full system prompt for a project.
pub fn build_system_prompt(state: &ProjectState) -> String {
    let technologies = if state.technologies.is_empty() {
        DEFAULT_TECHNOLOGIES.join(", ")
    } else {
        join(state.technologies.iter())
    };

    let libraries = if state.installed_libraries.is_empty() {
        "none".to_string()
    } else {
        join(state.installed_libraries.iter())
    };

    let mut prompt = String::with_capacity(BASE_INSTRUCTIONS.len() + 512);
    prompt.push_str(BASE_INSTRUCTIONS);
    prompt.push_str("\nCurrent project context:\n");
    let _ = writeln!(prompt, "- Technologies in use: {technologies}");
    let _ = writeln!(prompt, "- Installed libraries: {libraries}");
    let _ = writeln!(prompt, "- Number of files: {}", state.files.len());
    if !state.files.is_empty() {
        let _ = writeln!(prompt, "- Existing files: {}", join(state.file_names()));
    }
    prompt.push_str(
        "\nUse this context to understand the current state of the project and give more accurate answers.",
    );
    prompt
}

fn join<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
