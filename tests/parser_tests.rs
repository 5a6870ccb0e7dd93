// tests/parser_tests.rs
// Line scanning, rule dispatch and brace matching

use linetpl::parser::{
    find_quote_end, match_braces, scan_lines, Call, CommandKind, Interpolation, Parser,
    Position, RenderCommand,
};
use linetpl::remap::Severity;

// Helper: (kind, payload text) for each command of a parsed template
fn commands(text: &str) -> Vec<(CommandKind, String)> {
    Parser::new()
        .parse(text)
        .commands
        .iter()
        .map(|c| (c.kind(), c.payload().text().to_string()))
        .collect()
}

fn cmd(kind: CommandKind, text: &str) -> (CommandKind, String) {
    (kind, text.to_string())
}

#[cfg(test)]
mod brace_tests {
    use super::*;

    #[test]
    fn test_simple_pair() {
        assert_eq!(match_braces("{}", 0, 2), Some(1));
    }

    #[test]
    fn test_quoted_brace_is_skipped() {
        assert_eq!(match_braces("{\"}\"}", 0, 5), Some(4));
        assert_eq!(match_braces("{'}'}", 0, 5), Some(4));
    }

    #[test]
    fn test_unterminated() {
        assert_eq!(match_braces("{", 0, 1), None);
        assert_eq!(match_braces("{{}", 0, 3), None);
        assert_eq!(match_braces("{\"}", 0, 3), None);
    }

    #[test]
    fn test_nested_and_limit() {
        assert_eq!(match_braces("{a{b}c}", 0, 7), Some(6));
        assert_eq!(match_braces("{}", 0, 1), None);
        assert_eq!(match_braces("x{y}", 1, 4), Some(3));
    }

    #[test]
    fn test_closing_before_opening() {
        assert_eq!(match_braces("}{", 0, 2), None);
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let text = r#"{"\"}"}"#;
        assert_eq!(match_braces(text, 0, text.len()), Some(6));
    }

    #[test]
    fn test_find_quote_end() {
        assert_eq!(find_quote_end("'a'", 0, 3), Some(2));
        assert_eq!(find_quote_end(r#""a\"b""#, 0, 6), Some(5));
        assert_eq!(find_quote_end("\"abc", 0, 4), None);
        // must start on a quote
        assert_eq!(find_quote_end("a'b'", 0, 4), None);
    }
}

#[cfg(test)]
mod scanner_tests {
    use super::*;

    #[test]
    fn test_mixed_line_endings() {
        let text = "a\r\nb\n\rc\rd\n";
        let lines: Vec<&str> = scan_lines(text).map(|w| w.as_str()).collect();
        assert_eq!(lines, vec!["a", "b", "c", "d", ""]);

        let numbers: Vec<u32> = scan_lines(text).map(|w| w.position.line).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_double_newlines_are_two_lines() {
        assert_eq!(scan_lines("\n\n").count(), 3);
        assert_eq!(scan_lines("\r\r").count(), 3);
        assert_eq!(scan_lines("").count(), 1);
        assert_eq!(scan_lines("x").count(), 1);
    }

    #[test]
    fn test_blank_line_window() {
        let windows: Vec<_> = scan_lines("  \t\nx").collect();
        assert_eq!(windows[0].begin, 0);
        assert_eq!(windows[0].begin_non_space, 3);
        assert_eq!(windows[0].end, 3);
        assert_eq!(windows[0].trigger(), None);
        assert_eq!(windows[1].trigger(), Some('x'));
    }

    #[test]
    fn test_trailing_spaces_at_eof() {
        let windows: Vec<_> = scan_lines("a\n   ").collect();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].begin_non_space, 5);
        assert_eq!(windows[1].end, 5);
    }
}

#[cfg(test)]
mod rule_tests {
    use super::*;

    #[test]
    fn test_interpolation_sequence() {
        assert_eq!(
            commands("\\A#{B}C#{D}E"),
            vec![
                cmd(CommandKind::Text, "A"),
                cmd(CommandKind::Expression, "B"),
                cmd(CommandKind::Text, "C"),
                cmd(CommandKind::Expression, "D"),
                cmd(CommandKind::Text, "E"),
            ]
        );
    }

    #[test]
    fn test_interpolation_escape() {
        assert_eq!(
            commands("\\##include #{A}"),
            vec![
                cmd(CommandKind::Text, "#"),
                cmd(CommandKind::Text, "include "),
                cmd(CommandKind::Expression, "A"),
            ]
        );
    }

    #[test]
    fn test_interpolation_braces_inside_expression() {
        assert_eq!(
            commands("\\#{f(\"}\", new { a = 1 })}!"),
            vec![
                cmd(CommandKind::Expression, "f(\"}\", new { a = 1 })"),
                cmd(CommandKind::Text, "!"),
            ]
        );
    }

    #[test]
    fn test_interpolation_indentation() {
        assert_eq!(
            commands("\\  x"),
            vec![
                cmd(CommandKind::PushIndentation, "  "),
                cmd(CommandKind::Text, "x"),
                cmd(CommandKind::PopIndentation, ""),
            ]
        );
    }

    #[test]
    fn test_interpolation_line_appends_newline() {
        assert_eq!(
            commands("|Hi #{name}"),
            vec![
                cmd(CommandKind::Text, "Hi "),
                cmd(CommandKind::Expression, "name"),
                cmd(CommandKind::NewLine, ""),
            ]
        );
        assert_eq!(commands("|"), vec![cmd(CommandKind::NewLine, "")]);
    }

    #[test]
    fn test_unterminated_interpolation_recovers() {
        let parsed = Parser::new().parse("\\a#{b");
        let found: Vec<_> = parsed
            .commands
            .iter()
            .map(|c| (c.kind(), c.payload().text()))
            .collect();
        assert_eq!(found, vec![(CommandKind::Text, "a#{b")]);
        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.diagnostics[0].severity, Severity::Error);
        assert_eq!(parsed.diagnostics[0].position, Position::new(1, 3));
    }

    #[test]
    fn test_empty_interpolation_is_dropped_with_warning() {
        let parsed = Parser::new().parse("\\a#{ }b");
        assert_eq!(parsed.commands.len(), 2);
        assert_eq!(parsed.diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn test_call_rule() {
        assert_eq!(
            commands("=   A;"),
            vec![
                cmd(CommandKind::PushIndentation, "   "),
                cmd(CommandKind::Statement, "A;"),
                cmd(CommandKind::PopIndentation, ""),
            ]
        );
        assert_eq!(commands("=A;"), vec![cmd(CommandKind::Statement, "A;")]);
        assert_eq!(commands("="), vec![]);
    }

    #[test]
    fn test_trigger_after_leading_whitespace() {
        assert_eq!(
            commands("    =Foo();"),
            vec![cmd(CommandKind::Statement, "Foo();")]
        );
    }

    #[test]
    fn test_pragma() {
        let parsed = Parser::new().parse("#pragma include \"File.x\"");
        assert_eq!(parsed.commands.len(), 1);
        match &parsed.commands[0] {
            RenderCommand::Pragma {
                name,
                argument,
                line,
                ..
            } => {
                assert_eq!(name.text(), "include");
                assert_eq!(argument.text(), "File.x");
                assert_eq!(line.text(), "#pragma include \"File.x\"");
            }
            other => panic!("expected pragma, got {:?}", other),
        }
    }

    #[test]
    fn test_pragma_empty_argument() {
        let parsed = Parser::new().parse("#pragma include \"\"");
        match &parsed.commands[0] {
            RenderCommand::Pragma { argument, .. } => assert_eq!(argument.text(), ""),
            other => panic!("expected pragma, got {:?}", other),
        }
    }

    #[test]
    fn test_non_pragma_directives_pass_through() {
        assert_eq!(commands("#debug"), vec![cmd(CommandKind::Script, "#debug")]);
        assert_eq!(
            commands("#if DEBUG"),
            vec![cmd(CommandKind::Script, "#if DEBUG")]
        );
        assert!(Parser::new().parse("#pragmatic").diagnostics.is_empty());
    }

    #[test]
    fn test_malformed_pragma_falls_back_with_warning() {
        for line in [
            "#pragma include \"x",
            "#pragma include x",
            "#pragma \"x\"",
            "#pragma include \"x\" trailing",
        ] {
            let parsed = Parser::new().parse(line);
            let kinds: Vec<_> = parsed.commands.iter().map(|c| c.kind()).collect();
            assert_eq!(kinds, vec![CommandKind::Script], "line {:?}", line);
            assert_eq!(parsed.diagnostics.len(), 1, "line {:?}", line);
        }
    }

    #[test]
    fn test_pass_through_keeps_whole_line() {
        assert_eq!(
            commands("  foreach (var x in xs) {"),
            vec![cmd(CommandKind::Script, "  foreach (var x in xs) {")]
        );
    }

    #[test]
    fn test_span_positions() {
        let parsed = Parser::new().parse("x();\n\\Hi #{name}\n\\é#{y}");
        let positions: Vec<_> = parsed
            .commands
            .iter()
            .map(|c| (c.payload().text(), c.payload().position()))
            .collect();
        assert_eq!(
            positions,
            vec![
                ("x();", Position::new(1, 1)),
                ("Hi ", Position::new(2, 2)),
                ("name", Position::new(2, 7)),
                ("é", Position::new(3, 2)),
                ("y", Position::new(3, 5)),
            ]
        );
    }

    #[test]
    fn test_end_spans_follow_payload() {
        let parsed = Parser::new().parse("\\ab#{cd}");
        for command in &parsed.commands {
            assert_eq!(command.end().begin(), command.payload().end());
            assert!(command.end().is_empty());
        }
    }

    #[test]
    fn test_custom_rule_table() {
        let parser = Parser::empty();
        let kinds: Vec<_> = parser
            .parse("\\text\n=call();")
            .commands
            .iter()
            .map(|c| c.kind())
            .collect();
        assert_eq!(kinds, vec![CommandKind::Script, CommandKind::Script]);
    }

    #[test]
    fn test_multibyte_trigger() {
        let parser = Parser::new()
            .with_rule('é', Interpolation { new_line: false })
            .with_rule('»', Call);

        let parsed = parser.parse("é  x#{y}");
        let found: Vec<_> = parsed
            .commands
            .iter()
            .map(|c| (c.kind(), c.payload().text().to_string(), c.payload().position()))
            .collect();
        assert_eq!(
            found,
            vec![
                (CommandKind::PushIndentation, "  ".to_string(), Position::new(1, 2)),
                (CommandKind::Text, "x".to_string(), Position::new(1, 4)),
                (CommandKind::Expression, "y".to_string(), Position::new(1, 7)),
                (CommandKind::PopIndentation, "".to_string(), Position::new(1, 9)),
            ]
        );

        let kinds: Vec<_> = parser
            .parse("»A;")
            .commands
            .iter()
            .map(|c| (c.kind(), c.payload().text().to_string()))
            .collect();
        assert_eq!(kinds, vec![cmd(CommandKind::Statement, "A;")]);
    }
}
