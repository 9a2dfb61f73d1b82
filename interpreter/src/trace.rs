use std::fmt::{Display, Formatter};

use drawl_core::{Token, Type};

use crate::ast::Expr;

/// One step of the parse, recorded only when tracing is switched on.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    Enter {
        production: &'static str,
        depth: usize,
    },
    Exit {
        production: &'static str,
        depth: usize,
    },
    Match {
        ty: Type,
        lexeme: String,
    },
    /// Rendered dump of a completed expression tree.
    Tree(String),
}

/// Structured record of the grammar productions entered and exited, the
/// tokens matched, and (optionally) each parsed expression tree. Tests
/// assert on the events; `Display` renders the classic tab-indented listing
/// for humans.
#[derive(Debug, Default)]
pub struct Trace {
    enabled: bool,
    trees: bool,
    depth: usize,
    events: Vec<TraceEvent>,
}

impl Trace {
    pub(crate) fn new(enabled: bool, trees: bool) -> Self {
        Trace {
            enabled,
            trees,
            depth: 0,
            events: Vec::new(),
        }
    }

    pub(crate) fn enter(&mut self, production: &'static str) {
        if self.enabled {
            self.events.push(TraceEvent::Enter {
                production,
                depth: self.depth,
            });
            self.depth += 1;
        }
    }

    pub(crate) fn exit(&mut self, production: &'static str) {
        if self.enabled {
            self.depth -= 1;
            self.events.push(TraceEvent::Exit {
                production,
                depth: self.depth,
            });
        }
    }

    pub(crate) fn matched(&mut self, token: &Token) {
        if self.enabled {
            self.events.push(TraceEvent::Match {
                ty: token.ty,
                lexeme: token.lexeme.clone(),
            });
        }
    }

    pub(crate) fn tree(&mut self, expr: &Expr) {
        if self.trees {
            self.events.push(TraceEvent::Tree(expr.to_string()));
        }
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }
}

impl Display for Trace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for event in &self.events {
            match event {
                TraceEvent::Enter { production, depth } => {
                    writeln!(f, "{}Enter in {}", "\t".repeat(*depth), production)?
                }
                TraceEvent::Exit { production, depth } => {
                    writeln!(f, "{}Exit from {}", "\t".repeat(*depth), production)?
                }
                TraceEvent::Match { ty, lexeme } => {
                    writeln!(f, "Match token {:?} ({})", ty, lexeme)?
                }
                TraceEvent::Tree(dump) => writeln!(f, "{}", dump)?,
            }
        }
        Ok(())
    }
}
