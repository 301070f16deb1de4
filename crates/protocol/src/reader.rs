use crate::error::{ProtocolError, Result};
use crate::event::Event;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::object_ref::ObjectRef;

/// An event together with the line it was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedEvent {
    pub line: usize,
    pub event: Event,
}

/// Streaming reader over a trace log.
///
/// Yields events in log order. The first error ends the stream: a corrupt
/// log cannot be resynchronised reliably, so the caller rejects the source.
pub struct EventReader<'a> {
    lexer: Lexer<'a>,
    failed: bool,
}

impl<'a> EventReader<'a> {
    #[must_use]
    pub fn new(src: &'a str) -> Self {
        Self {
            lexer: Lexer::new(src),
            failed: false,
        }
    }

    fn next_event(&mut self) -> Result<Option<LocatedEvent>> {
        let head = loop {
            let token = self.lexer.next_token()?;
            match token.kind {
                TokenKind::Semi => continue,
                TokenKind::Eof => return Ok(None),
                _ => break token,
            }
        };
        let line = head.line;
        let TokenKind::Ident(ident) = head.kind else {
            return Err(unexpected(&head, "identifier"));
        };

        let event = if ident == "RegisterPackage" {
            self.expect(TokenKind::LParen, "'('")?;
            let name = self.string()?;
            self.expect(TokenKind::RParen, "')'")?;
            let target = self.target()?;
            Event::RegisterPackage { name, target }
        } else {
            let object = ObjectRef::parse(&ident)?;
            self.expect(TokenKind::Period, "'.'")?;
            let method = self.ident()?;
            self.expect(TokenKind::LParen, "'('")?;
            match method.as_str() {
                "RegisterFunction" => {
                    let name = self.string()?;
                    self.expect(TokenKind::Comma, "','")?;
                    let file = self.string()?;
                    self.expect(TokenKind::Comma, "','")?;
                    let start = self.int()?;
                    self.expect(TokenKind::Comma, "','")?;
                    let end = self.int()?;
                    self.expect(TokenKind::RParen, "')'")?;
                    let target = self.target()?;
                    Event::RegisterFunction {
                        package: object,
                        name,
                        file,
                        start,
                        end,
                        target,
                    }
                }
                "RegisterStatement" => {
                    let start = self.int()?;
                    self.expect(TokenKind::Comma, "','")?;
                    let end = self.int()?;
                    self.expect(TokenKind::RParen, "')'")?;
                    let target = self.target()?;
                    Event::RegisterStatement {
                        function: object,
                        start,
                        end,
                        target,
                    }
                }
                "Enter" | "Leave" | "At" => {
                    self.expect(TokenKind::RParen, "')'")?;
                    match method.as_str() {
                        "Enter" => Event::Enter(object),
                        "Leave" => Event::Leave(object),
                        _ => Event::At(object),
                    }
                }
                _ => return Err(ProtocolError::UnknownMethod { line, method }),
            }
        };

        let end = self.lexer.next_token()?;
        if end.kind != TokenKind::Semi {
            return Err(unexpected(&end, "end of statement"));
        }
        Ok(Some(LocatedEvent { line, event }))
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<()> {
        let token = self.lexer.next_token()?;
        if token.kind == kind {
            Ok(())
        } else {
            Err(unexpected(&token, expected))
        }
    }

    fn ident(&mut self) -> Result<String> {
        let token = self.lexer.next_token()?;
        match token.kind {
            TokenKind::Ident(value) => Ok(value),
            _ => Err(unexpected(&token, "identifier")),
        }
    }

    fn string(&mut self) -> Result<String> {
        let token = self.lexer.next_token()?;
        match token.kind {
            TokenKind::Str(value) => Ok(value),
            _ => Err(unexpected(&token, "string literal")),
        }
    }

    fn int(&mut self) -> Result<usize> {
        let token = self.lexer.next_token()?;
        match token.kind {
            TokenKind::Int(value) => Ok(value),
            _ => Err(unexpected(&token, "integer literal")),
        }
    }

    /// `: <objectRef>` closing a registration
    fn target(&mut self) -> Result<ObjectRef> {
        self.expect(TokenKind::Colon, "':'")?;
        let ident = self.ident()?;
        ObjectRef::parse(&ident)
    }
}

fn unexpected(token: &Token, expected: &'static str) -> ProtocolError {
    ProtocolError::unexpected(token.line, token.column, expected, token.kind.describe())
}

impl Iterator for EventReader<'_> {
    type Item = Result<LocatedEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.lexer.is_done() {
            return None;
        }
        match self.next_event() {
            Ok(event) => event.map(Ok),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Read a whole trace log into events.
pub fn parse_events(src: &str) -> Result<Vec<LocatedEvent>> {
    EventReader::new(src).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TRACE: &str = r#"RegisterPackage("example.com/p"): gocovObject0
gocovObject0.RegisterFunction("T.Run", "/src/p/t.go", 10, 52): gocovObject1
gocovObject1.RegisterStatement(24, 30): gocovObject2
gocovObject1.Enter()
gocovObject2.At()
gocovObject1.Leave()
"#;

    #[test]
    fn reads_every_event_kind() {
        let events: Vec<Event> = parse_events(TRACE)
            .unwrap()
            .into_iter()
            .map(|located| located.event)
            .collect();
        assert_eq!(
            events,
            vec![
                Event::RegisterPackage {
                    name: "example.com/p".into(),
                    target: ObjectRef::new(0),
                },
                Event::RegisterFunction {
                    package: ObjectRef::new(0),
                    name: "T.Run".into(),
                    file: "/src/p/t.go".into(),
                    start: 10,
                    end: 52,
                    target: ObjectRef::new(1),
                },
                Event::RegisterStatement {
                    function: ObjectRef::new(1),
                    start: 24,
                    end: 30,
                    target: ObjectRef::new(2),
                },
                Event::Enter(ObjectRef::new(1)),
                Event::At(ObjectRef::new(2)),
                Event::Leave(ObjectRef::new(1)),
            ]
        );
    }

    #[test]
    fn encoded_events_read_back() {
        let text: String = parse_events(TRACE)
            .unwrap()
            .iter()
            .map(|located| located.event.encode())
            .collect();
        assert_eq!(text, TRACE);
    }

    #[test]
    fn accepts_semicolons_and_spacing() {
        let events = parse_events("gocovObject3 . At ( ) ; gocovObject4.At();").unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event, Event::At(ObjectRef::new(4)));
    }

    #[test]
    fn records_line_numbers() {
        let events = parse_events("\n\ngocovObject3.At()\n").unwrap();
        assert_eq!(events[0].line, 3);
    }

    #[test]
    fn rejects_unknown_method() {
        let err = parse_events("gocovObject1.Exit()\n").unwrap_err();
        assert_eq!(
            err,
            ProtocolError::UnknownMethod {
                line: 1,
                method: "Exit".into()
            }
        );
    }

    #[test]
    fn rejects_two_statements_on_one_line() {
        let err = parse_events("gocovObject1.At() gocovObject2.At()\n").unwrap_err();
        assert!(matches!(err, ProtocolError::Unexpected { line: 1, column: 19, .. }));
    }

    #[test]
    fn rejects_truncated_registration() {
        let err = parse_events("RegisterPackage(\"p\")\n").unwrap_err();
        assert!(matches!(err, ProtocolError::Unexpected { expected: "':'", .. }));
    }

    #[test]
    fn rejects_bad_object_name() {
        let err = parse_events("object1.At()\n").unwrap_err();
        assert_eq!(err, ProtocolError::InvalidObjectRef("object1".into()));
    }

    #[test]
    fn reader_stops_after_first_error() {
        let mut reader = EventReader::new("gocovObject1.At(\ngocovObject2.At()\n");
        assert!(matches!(reader.next(), Some(Err(_))));
        assert!(reader.next().is_none());
    }
}
