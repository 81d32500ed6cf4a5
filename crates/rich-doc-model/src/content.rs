//! # Content expressions
//!
//! Every node type declares which children it accepts with a small regular
//! language over node type names and groups:
//!
//! ```text
//! block+                      one or more nodes of the `block` group
//! paragraph block*            a paragraph followed by any blocks
//! (table_cell | table_header)* any mix of cells
//! heading{1,3}                between one and three headings
//! ```
//!
//! Expressions go through three stages:
//!
//! ```text
//! Source → Lexer → Tokens → Parser → Expr → NFA → DFA (ContentMatch states)
//!          (Logos)
//! ```
//!
//! The compiled automaton is shared (`Arc`) by every [`ContentMatch`] that
//! points into it, so matching never allocates.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use logos::Logos;

use crate::error::SchemaError;
use crate::fragment::Fragment;
use crate::schema::NodeType;

/// Token kinds of the content expression language.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
enum TokenKind {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Name,

    #[regex(r"[0-9]+")]
    Number,

    #[token("|")]
    Pipe,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("*")]
    Star,

    #[token("+")]
    Plus,

    #[token("?")]
    Question,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(",")]
    Comma,
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    kind: TokenKind,
    text: &'a str,
}

fn lex(expr: &str) -> Result<Vec<Token<'_>>, SchemaError> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(expr);

    while let Some(result) = lexer.next() {
        let text = lexer.slice();
        match result {
            Ok(kind) => tokens.push(Token { kind, text }),
            Err(()) => {
                return Err(SchemaError::InvalidContentExpression {
                    expr: expr.to_string(),
                    message: format!("unexpected character `{text}`"),
                });
            }
        }
    }

    Ok(tokens)
}

/// Parsed content expression. Names are already resolved to node type ids.
#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Choice(Vec<Expr>),
    Seq(Vec<Expr>),
    Plus(Box<Expr>),
    Star(Box<Expr>),
    Opt(Box<Expr>),
    Range {
        min: usize,
        max: Option<usize>,
        expr: Box<Expr>,
    },
    Name(usize),
}

/// Lookup table the parser resolves names against while the schema is
/// being built.
pub(crate) struct NameTable<'a> {
    pub types: &'a HashMap<String, usize>,
    pub groups: &'a HashMap<String, Vec<usize>>,
    pub inline: &'a [bool],
}

impl NameTable<'_> {
    fn resolve(&self, name: &str) -> Option<Vec<usize>> {
        if let Some(&id) = self.types.get(name) {
            return Some(vec![id]);
        }
        self.groups.get(name).cloned()
    }
}

struct ExprParser<'t, 'a> {
    source: &'t str,
    tokens: Vec<Token<'t>>,
    pos: usize,
    names: &'t NameTable<'a>,
    /// Set by the first resolved name; every later name must agree.
    inline: Option<bool>,
}

impl<'t, 'a> ExprParser<'t, 'a> {
    fn current(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.current() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn bump(&mut self) -> Option<Token<'t>> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn err(&self, message: impl Into<String>) -> SchemaError {
        SchemaError::InvalidContentExpression {
            expr: self.source.to_string(),
            message: message.into(),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, SchemaError> {
        let mut exprs = vec![self.parse_seq()?];
        while self.eat(TokenKind::Pipe) {
            exprs.push(self.parse_seq()?);
        }
        Ok(if exprs.len() == 1 {
            exprs.remove(0)
        } else {
            Expr::Choice(exprs)
        })
    }

    fn parse_seq(&mut self) -> Result<Expr, SchemaError> {
        let mut exprs = Vec::new();
        loop {
            exprs.push(self.parse_subscript()?);
            match self.current() {
                None | Some(TokenKind::Pipe) | Some(TokenKind::RParen) => break,
                _ => {}
            }
        }
        Ok(if exprs.len() == 1 {
            exprs.remove(0)
        } else {
            Expr::Seq(exprs)
        })
    }

    fn parse_subscript(&mut self) -> Result<Expr, SchemaError> {
        let mut expr = self.parse_atom()?;
        loop {
            if self.eat(TokenKind::Plus) {
                expr = Expr::Plus(Box::new(expr));
            } else if self.eat(TokenKind::Star) {
                expr = Expr::Star(Box::new(expr));
            } else if self.eat(TokenKind::Question) {
                expr = Expr::Opt(Box::new(expr));
            } else if self.eat(TokenKind::LBrace) {
                expr = self.parse_range(expr)?;
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_number(&mut self) -> Result<usize, SchemaError> {
        match self.bump() {
            Some(Token {
                kind: TokenKind::Number,
                text,
            }) => text
                .parse()
                .map_err(|_| self.err(format!("number `{text}` is too large"))),
            Some(token) => Err(self.err(format!("expected number, got `{}`", token.text))),
            None => Err(self.err("expected number, got end of input")),
        }
    }

    fn parse_range(&mut self, expr: Expr) -> Result<Expr, SchemaError> {
        let min = self.parse_number()?;
        let max = if self.eat(TokenKind::Comma) {
            if self.current() == Some(TokenKind::Number) {
                Some(self.parse_number()?)
            } else {
                None
            }
        } else {
            Some(min)
        };
        if !self.eat(TokenKind::RBrace) {
            return Err(self.err("unclosed braced range"));
        }
        if let Some(max) = max
            && max < min
        {
            return Err(self.err(format!("range {{{min},{max}}} is empty")));
        }
        Ok(Expr::Range {
            min,
            max,
            expr: Box::new(expr),
        })
    }

    fn parse_atom(&mut self) -> Result<Expr, SchemaError> {
        if self.eat(TokenKind::LParen) {
            let expr = self.parse_expr()?;
            if !self.eat(TokenKind::RParen) {
                return Err(self.err("missing closing paren"));
            }
            return Ok(expr);
        }

        match self.bump() {
            Some(Token {
                kind: TokenKind::Name,
                text,
            }) => self.resolve_name(text),
            Some(token) => Err(self.err(format!("unexpected token `{}`", token.text))),
            None => Err(self.err("unexpected end of input")),
        }
    }

    fn resolve_name(&mut self, name: &str) -> Result<Expr, SchemaError> {
        let ids = self
            .names
            .resolve(name)
            .filter(|ids| !ids.is_empty())
            .ok_or_else(|| SchemaError::UnknownName {
                name: name.to_string(),
                expr: self.source.to_string(),
            })?;

        for &id in &ids {
            let inline = self.names.inline[id];
            match self.inline {
                None => self.inline = Some(inline),
                Some(seen) if seen != inline => {
                    return Err(SchemaError::MixedContent(self.source.to_string()));
                }
                Some(_) => {}
            }
        }

        let mut exprs: Vec<Expr> = ids.into_iter().map(Expr::Name).collect();
        Ok(if exprs.len() == 1 {
            exprs.remove(0)
        } else {
            Expr::Choice(exprs)
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct NfaEdge {
    term: Option<usize>,
    to: Option<usize>,
}

/// (state, edge index) handle for an edge whose target is not yet known.
type Dangling = (usize, usize);

#[derive(Debug, Default)]
struct Nfa {
    states: Vec<Vec<NfaEdge>>,
}

impl Nfa {
    fn node(&mut self) -> usize {
        self.states.push(Vec::new());
        self.states.len() - 1
    }

    fn edge(&mut self, from: usize, to: Option<usize>, term: Option<usize>) -> Dangling {
        self.states[from].push(NfaEdge { term, to });
        (from, self.states[from].len() - 1)
    }

    fn connect(&mut self, edges: &[Dangling], to: usize) {
        for &(state, edge) in edges {
            self.states[state][edge].to = Some(to);
        }
    }

    fn compile(&mut self, expr: &Expr, from: usize) -> Vec<Dangling> {
        match expr {
            Expr::Choice(exprs) => exprs.iter().flat_map(|e| self.compile(e, from)).collect(),
            Expr::Seq(exprs) => {
                let mut from = from;
                let mut next = Vec::new();
                for (i, e) in exprs.iter().enumerate() {
                    next = self.compile(e, from);
                    if i + 1 < exprs.len() {
                        from = self.node();
                        self.connect(&next, from);
                    }
                }
                next
            }
            Expr::Star(inner) => {
                let lp = self.node();
                self.edge(from, Some(lp), None);
                let body = self.compile(inner, lp);
                self.connect(&body, lp);
                vec![self.edge(lp, None, None)]
            }
            Expr::Plus(inner) => {
                let lp = self.node();
                let first = self.compile(inner, from);
                self.connect(&first, lp);
                let body = self.compile(inner, lp);
                self.connect(&body, lp);
                vec![self.edge(lp, None, None)]
            }
            Expr::Opt(inner) => {
                let mut out = vec![self.edge(from, None, None)];
                out.extend(self.compile(inner, from));
                out
            }
            Expr::Range { min, max, expr } => {
                let mut cur = from;
                for _ in 0..*min {
                    let next = self.node();
                    let body = self.compile(expr, cur);
                    self.connect(&body, next);
                    cur = next;
                }
                match max {
                    None => {
                        let body = self.compile(expr, cur);
                        self.connect(&body, cur);
                    }
                    Some(max) => {
                        for _ in *min..*max {
                            let next = self.node();
                            self.edge(cur, Some(next), None);
                            let body = self.compile(expr, cur);
                            self.connect(&body, next);
                            cur = next;
                        }
                    }
                }
                vec![self.edge(cur, None, None)]
            }
            Expr::Name(id) => vec![self.edge(from, None, Some(*id))],
        }
    }

    fn null_closure(&self, start: usize) -> BTreeSet<usize> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![start];
        while let Some(state) = stack.pop() {
            if !seen.insert(state) {
                continue;
            }
            for edge in &self.states[state] {
                if edge.term.is_none()
                    && let Some(to) = edge.to
                {
                    stack.push(to);
                }
            }
        }
        seen
    }
}

#[derive(Debug, Clone, Default)]
struct DfaState {
    valid_end: bool,
    /// (node type id, next state), in first-seen order.
    next: Vec<(usize, usize)>,
}

#[derive(Debug, Default)]
struct Automaton {
    states: Vec<DfaState>,
    inline_content: bool,
}

impl Automaton {
    fn from_nfa(nfa: &Nfa) -> Self {
        let accept = nfa.states.len() - 1;
        let mut labeled: BTreeMap<Vec<usize>, usize> = BTreeMap::new();
        let mut states = Vec::new();
        let mut queue = Vec::new();

        let start: Vec<usize> = nfa.null_closure(0).into_iter().collect();
        labeled.insert(start.clone(), 0);
        states.push(DfaState::default());
        queue.push(start);

        let mut cursor = 0;
        while cursor < queue.len() {
            let set = queue[cursor].clone();
            let index = labeled[&set];
            cursor += 1;

            let mut out: Vec<(usize, BTreeSet<usize>)> = Vec::new();
            for &state in &set {
                for edge in &nfa.states[state] {
                    let (Some(term), Some(to)) = (edge.term, edge.to) else {
                        continue;
                    };
                    let targets = nfa.null_closure(to);
                    match out.iter_mut().find(|(t, _)| *t == term) {
                        Some((_, existing)) => existing.extend(targets),
                        None => out.push((term, targets)),
                    }
                }
            }

            let mut next = Vec::with_capacity(out.len());
            for (term, targets) in out {
                let key: Vec<usize> = targets.into_iter().collect();
                let target = match labeled.get(&key) {
                    Some(&existing) => existing,
                    None => {
                        let id = states.len();
                        states.push(DfaState::default());
                        labeled.insert(key.clone(), id);
                        queue.push(key);
                        id
                    }
                };
                next.push((term, target));
            }

            states[index] = DfaState {
                valid_end: set.contains(&accept),
                next,
            };
        }

        Self {
            states,
            inline_content: false,
        }
    }
}

/// A state in a node type's content automaton.
///
/// Obtained from [`NodeType::content_match`] and advanced with
/// [`match_type`](ContentMatch::match_type) or
/// [`match_fragment`](ContentMatch::match_fragment). Cheap to clone.
#[derive(Clone)]
pub struct ContentMatch {
    automaton: Arc<Automaton>,
    state: usize,
}

impl ContentMatch {
    /// The match of a node type that accepts no children.
    pub fn empty() -> Self {
        Self {
            automaton: Arc::new(Automaton {
                states: vec![DfaState {
                    valid_end: true,
                    next: Vec::new(),
                }],
                inline_content: false,
            }),
            state: 0,
        }
    }

    /// Compile `expr` against the schema's type table.
    pub(crate) fn parse(expr: &str, names: &NameTable<'_>) -> Result<Self, SchemaError> {
        let tokens = lex(expr)?;
        if tokens.is_empty() {
            return Ok(Self::empty());
        }

        let mut parser = ExprParser {
            source: expr,
            tokens,
            pos: 0,
            names,
            inline: None,
        };
        let parsed = parser.parse_expr()?;
        if let Some(token) = parser.bump() {
            return Err(parser.err(format!("unexpected trailing token `{}`", token.text)));
        }

        let mut nfa = Nfa::default();
        nfa.node();
        let dangling = nfa.compile(&parsed, 0);
        let accept = nfa.node();
        nfa.connect(&dangling, accept);

        let mut automaton = Automaton::from_nfa(&nfa);
        automaton.inline_content = parser.inline == Some(true);
        Ok(Self {
            automaton: Arc::new(automaton),
            state: 0,
        })
    }

    fn dfa_state(&self) -> &DfaState {
        &self.automaton.states[self.state]
    }

    fn advance(&self, type_id: usize) -> Option<ContentMatch> {
        self.dfa_state()
            .next
            .iter()
            .find(|(id, _)| *id == type_id)
            .map(|&(_, state)| ContentMatch {
                automaton: Arc::clone(&self.automaton),
                state,
            })
    }

    /// Match a node type, returning the state after it, or `None` if the
    /// type is not allowed here.
    pub fn match_type(&self, node_type: &NodeType) -> Option<ContentMatch> {
        self.advance(node_type.id())
    }

    /// Match every child of `fragment` in turn.
    pub fn match_fragment(&self, fragment: &Fragment) -> Option<ContentMatch> {
        self.match_fragment_range(fragment, 0, fragment.child_count())
    }

    /// Match the children of `fragment` in `start..end`.
    pub fn match_fragment_range(
        &self,
        fragment: &Fragment,
        start: usize,
        end: usize,
    ) -> Option<ContentMatch> {
        let mut current = self.clone();
        for child in fragment.iter().take(end).skip(start) {
            current = current.match_type(child.node_type())?;
        }
        Some(current)
    }

    /// True when the content seen so far is a complete, valid sequence.
    pub fn valid_end(&self) -> bool {
        self.dfa_state().valid_end
    }

    /// True when the expression this match belongs to consists of inline
    /// types.
    pub fn inline_content(&self) -> bool {
        self.automaton.inline_content
    }

    /// Number of outgoing transitions from this state.
    pub fn edge_count(&self) -> usize {
        self.dfa_state().next.len()
    }

    /// Node type id of the `n`th outgoing transition.
    pub fn edge_type_id(&self, n: usize) -> Option<usize> {
        self.dfa_state().next.get(n).map(|&(id, _)| id)
    }

    /// True if this state and `other` accept at least one common type.
    pub fn compatible(&self, other: &ContentMatch) -> bool {
        self.dfa_state()
            .next
            .iter()
            .any(|(id, _)| other.dfa_state().next.iter().any(|(o, _)| o == id))
    }
}

impl PartialEq for ContentMatch {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.automaton, &other.automaton) && self.state == other.state
    }
}

impl std::fmt::Debug for ContentMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentMatch")
            .field("state", &self.state)
            .field("valid_end", &self.valid_end())
            .field("edges", &self.dfa_state().next)
            .finish()
    }
}
