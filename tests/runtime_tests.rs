// tests/runtime_tests.rs
// Renderer sessions, indentation, caller tracking and the render event protocol

use linetpl::backend::RenderEvent;
use linetpl::error::RenderError;
use linetpl::parser::{FilePosition, Position};
use linetpl::{Features, Renderer};

fn at(file: &str, line: u32, column: u32) -> FilePosition {
    FilePosition::new(file, line, column)
}

fn attached(newline: &str) -> Renderer {
    let mut renderer = Renderer::new(newline);
    renderer.attach();
    renderer
}

#[cfg(test)]
mod session_tests {
    use super::*;

    #[test]
    fn test_unattached_renderer_is_inert() {
        let mut r = Renderer::new("\n");
        r.write("ignored", &at("a.tpl", 1, 1), Features::NONE);
        r.write_line(&at("a.tpl", 1, 1));
        r.push_indentation("  ", &at("a.tpl", 1, 1), Features::NONE);
        r.push_caller(&at("a.tpl", 1, 1));

        assert!(!r.is_attached());
        assert_eq!(r.output(), None);
        assert!(r.mapping().is_empty());
        assert_eq!(r.pop_indentation(), Ok(()));
        assert_eq!(r.pop_caller(), Ok(()));
        assert!(r.detach().is_none());
    }

    #[test]
    fn test_attach_resets_previous_session() {
        let mut r = attached("\n");
        r.push_indentation("  ", &at("a.tpl", 1, 1), Features::NONE);
        r.write("first", &at("a.tpl", 1, 2), Features::NONE);

        r.attach();
        r.write("second", &at("a.tpl", 2, 2), Features::NONE);
        assert_eq!(r.indentation_depth(), 0);
        let rendered = r.detach().unwrap();
        assert_eq!(rendered.output, "second");
        assert_eq!(rendered.mapping.entries().len(), 1);
        assert!(!r.is_attached());
    }

    #[test]
    fn test_configured_newline() {
        let mut r = attached("\r\n");
        r.write("a", &at("a.tpl", 1, 2), Features::NONE);
        r.write_line(&at("a.tpl", 1, 3));
        r.write("b", &at("a.tpl", 2, 2), Features::NONE);
        assert_eq!(r.output(), Some("a\r\nb"));
        assert_eq!(r.position(), Position::new(2, 2));
    }
}

#[cfg(test)]
mod indentation_tests {
    use super::*;

    #[test]
    fn test_indentation_applies_at_line_start_only() {
        let mut r = attached("\n");
        r.push_indentation("  ", &at("a.tpl", 1, 1), Features::NONE);
        r.write("a", &at("a.tpl", 1, 3), Features::NONE);
        r.write("b", &at("a.tpl", 1, 4), Features::NONE);
        r.write_line(&at("a.tpl", 1, 5));
        r.write("c", &at("a.tpl", 2, 3), Features::NONE);
        r.pop_indentation().unwrap();
        r.write_line(&at("a.tpl", 2, 4));
        r.write("d", &at("a.tpl", 3, 2), Features::NONE);
        assert_eq!(r.output(), Some("  ab\n  c\nd"));
    }

    #[test]
    fn test_nested_indentation_accumulates() {
        let mut r = attached("\n");
        r.push_indentation("  ", &at("a.tpl", 1, 1), Features::NONE);
        r.push_indentation("--", &at("a.tpl", 1, 1), Features::NONE);
        assert_eq!(r.indentation_depth(), 2);
        r.write("x", &at("a.tpl", 1, 1), Features::NONE);
        r.pop_indentation().unwrap();
        r.write_line(&at("a.tpl", 1, 2));
        r.write("y", &at("a.tpl", 2, 1), Features::NONE);
        assert_eq!(r.output(), Some("  --x\n  y"));
    }

    #[test]
    fn test_empty_write_does_not_indent() {
        let mut r = attached("\n");
        r.push_indentation("    ", &at("a.tpl", 1, 1), Features::NONE);
        r.write("", &at("a.tpl", 1, 1), Features::NONE);
        r.write_line(&at("a.tpl", 1, 1));
        assert_eq!(r.output(), Some("\n"));
    }

    #[test]
    fn test_multiline_write_indents_every_line() {
        let mut r = attached("\n");
        r.push_indentation(">", &at("a.tpl", 1, 1), Features::NONE);
        r.write("a\nb\n\nc", &at("b.tpl", 1, 2), Features::MULTILINE);
        assert_eq!(r.output(), Some(">a\n>b\n\n>c"));
        assert_eq!(r.position(), Position::new(4, 3));

        let generated: Vec<Position> =
            r.mapping().entries().iter().map(|e| e.generated).collect();
        assert_eq!(
            generated,
            vec![
                Position::new(1, 1),
                Position::new(1, 2),
                Position::new(2, 1),
                Position::new(2, 2),
                Position::new(4, 1),
                Position::new(4, 2),
            ]
        );
        assert_eq!(r.mapping().caller_chain(Position::new(2, 1)), vec![at("a.tpl", 1, 1)]);
        assert_eq!(r.mapping().caller_chain(Position::new(2, 2)), vec![at("b.tpl", 1, 2)]);
        assert_eq!(r.mapping().caller_chain(Position::new(3, 1)), vec![at("b.tpl", 1, 2)]);
    }

    #[test]
    fn test_indentation_traces_to_pushing_line() {
        let mut r = attached("\n");
        r.push_indentation("    ", &at("a.tpl", 2, 1), Features::NONE);
        r.write("x", &at("a.tpl", 2, 5), Features::NONE);
        let rendered = r.detach().unwrap();

        assert_eq!(rendered.output, "    x");
        assert_eq!(
            rendered.mapping.caller_chain(Position::new(1, 3)),
            vec![at("a.tpl", 2, 1)]
        );
        assert_eq!(
            rendered.mapping.caller_chain(Position::new(1, 5)),
            vec![at("a.tpl", 2, 5)]
        );
    }

    #[test]
    fn test_pop_underflow() {
        let mut r = attached("\n");
        assert_eq!(r.pop_indentation(), Err(RenderError::IndentationUnderflow));
        assert_eq!(r.pop_caller(), Err(RenderError::CallerUnderflow));
    }
}

#[cfg(test)]
mod caller_tests {
    use super::*;

    #[test]
    fn test_output_traces_through_call_sites() {
        let mut r = attached("\n");
        r.write("head", &at("main.tpl", 1, 2), Features::NONE);
        r.write_line(&at("main.tpl", 1, 6));
        r.push_caller(&at("main.tpl", 3, 2));
        r.push_caller(&at("list.tpl", 5, 4));
        r.write("item", &at("item.tpl", 1, 2), Features::NONE);
        r.pop_caller().unwrap();
        r.pop_caller().unwrap();
        let rendered = r.detach().unwrap();

        assert_eq!(rendered.output, "head\nitem");
        assert_eq!(
            rendered.mapping.caller_chain(Position::new(2, 3)),
            vec![
                at("item.tpl", 1, 2),
                at("list.tpl", 5, 4),
                at("main.tpl", 3, 2),
            ]
        );
        assert_eq!(
            rendered.mapping.caller_chain(Position::new(1, 2)),
            vec![at("main.tpl", 1, 2)]
        );
    }

    #[test]
    fn test_live_call_sites_innermost_first() {
        let mut r = attached("\n");
        assert!(r.call_sites().is_empty());
        r.push_caller(&at("main.tpl", 3, 2));
        r.push_caller(&at("list.tpl", 5, 4));
        assert_eq!(
            r.call_sites(),
            vec![at("list.tpl", 5, 4), at("main.tpl", 3, 2)]
        );
        r.pop_caller().unwrap();
        assert_eq!(r.call_sites(), vec![at("main.tpl", 3, 2)]);
    }

    #[test]
    fn test_sibling_calls_get_distinct_sites() {
        let mut r = attached("\n");
        r.push_caller(&at("main.tpl", 2, 2));
        r.write("a", &at("part.tpl", 1, 2), Features::NONE);
        r.pop_caller().unwrap();
        r.push_caller(&at("main.tpl", 3, 2));
        r.write("b", &at("part.tpl", 1, 2), Features::NONE);
        r.pop_caller().unwrap();

        let mapping = r.mapping();
        assert_eq!(mapping.callers().len(), 2);
        assert_eq!(
            mapping.caller_chain(Position::new(1, 2)),
            vec![at("part.tpl", 1, 2), at("main.tpl", 3, 2)]
        );
    }
}

#[cfg(test)]
mod protocol_tests {
    use super::*;
    use linetpl::backend::RuntimeException;

    fn replay(lines: &[&str], r: &mut Renderer) -> Result<(), RuntimeException> {
        for line in lines {
            RenderEvent::parse(line).unwrap().apply(r)?;
        }
        Ok(())
    }

    #[test]
    fn test_events_drive_renderer() {
        let mut r = attached("\n");
        replay(
            &[
                r#"{"op":"pushIndentation","text":"  ","file":"a.tpl","line":1,"column":1}"#,
                r#"{"op":"write","text":"Hi","file":"a.tpl","line":1,"column":3}"#,
                r#"{"op":"popIndentation"}"#,
                r#"{"op":"writeLine","file":"a.tpl","line":1,"column":5}"#,
                r#"{"op":"pushCaller","file":"a.tpl","line":2,"column":2}"#,
                r#"{"op":"write","text":"x\ny","file":"b.tpl","line":1,"column":2,"features":1}"#,
                r#"{"op":"popCaller"}"#,
            ],
            &mut r,
        )
        .unwrap();

        assert_eq!(r.output(), Some("  Hi\nx\ny"));
        assert_eq!(
            r.mapping().caller_chain(Position::new(1, 2)),
            vec![at("a.tpl", 1, 1)]
        );
        assert_eq!(
            r.mapping().caller_chain(Position::new(3, 1)),
            vec![at("b.tpl", 1, 2), at("a.tpl", 2, 2)]
        );
    }

    #[test]
    fn test_exception_event_is_returned() {
        let mut r = attached("\n");
        let result = replay(
            &[
                r#"{"op":"write","text":"partial","file":"a.tpl","line":1,"column":2}"#,
                r#"{"op":"exception","type":"NullReferenceException","message":"boom","frames":[{"method":"Page.Render","generatedPath":"a.tpl.g.cs","generatedLine":4,"generatedColumn":11}]}"#,
            ],
            &mut r,
        );
        let exception = result.unwrap_err();
        assert_eq!(exception.kind, "NullReferenceException");
        assert_eq!(exception.frames[0].generated_line, Some(4));
        assert_eq!(r.output(), Some("partial"));
    }

    #[test]
    fn test_unbalanced_pop_becomes_exception() {
        let mut r = attached("\n");
        let exception = replay(&[r#"{"op":"popCaller"}"#], &mut r).unwrap_err();
        assert_eq!(exception.kind, "RenderError");
    }

    #[test]
    fn test_null_indentation_is_rejected() {
        assert!(RenderEvent::parse(r#"{"op":"pushIndentation","text":null,"file":"a.tpl","line":1,"column":1}"#).is_err());
        assert!(RenderEvent::parse(r#"{"op":"teleport"}"#).is_err());
    }
}
