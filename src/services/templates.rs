//! Built-in code templates
//!
//! Starter snippets the editor offers as one-click inserts.

use serde::Serialize;

/// A named starter snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CodeTemplate {
    pub name: &'static str,
    pub code: &'static str,
}

pub const TEMPLATES: &[CodeTemplate] = &[
    CodeTemplate {
        name: "Hello World",
        code: "print('Hello World 🌍')",
    },
    CodeTemplate {
        name: "Loop",
        code: "for i in range(5):\n    print('Count:', i)",
    },
    CodeTemplate {
        name: "Fibonacci",
        code: "n = 10\na, b = 0, 1\nfor _ in range(n):\n    print(a)\n    a, b = b, a + b",
    },
];

/// Look up a template by its display name.
pub fn find(name: &str) -> Option<&'static CodeTemplate> {
    TEMPLATES.iter().find(|template| template.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_templates_ship() {
        assert_eq!(TEMPLATES.len(), 3);
        let names: Vec<_> = TEMPLATES.iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Hello World", "Loop", "Fibonacci"]);
    }

    #[test]
    fn find_by_name() {
        let template = find("Hello World").unwrap();
        assert_eq!(template.code, "print('Hello World 🌍')");

        assert!(find("Quicksort").is_none());
    }

    #[test]
    fn loop_template_prints_five_counts() {
        let template = find("Loop").unwrap();
        assert!(template.code.starts_with("for i in range(5):"));
        assert!(template.code.contains("print('Count:', i)"));
    }

    #[test]
    fn fibonacci_template_is_iterative() {
        let template = find("Fibonacci").unwrap();
        assert!(template.code.starts_with("n = 10"));
        assert!(template.code.contains("a, b = b, a + b"));
    }
}
