//! Terminal rendering of markdown answers.
//!
//! Each line is split into a block marker (heading, list item, quote, fence,
//! rule) and inline spans (code, bold, italic, text) by winnow parsers;
//! styling is done with crossterm.

use crewcraft_error::Result;
use crossterm::style::Stylize;
use std::io::Write;
use winnow::ascii::{digit1, space0, space1, till_line_ending};
use winnow::combinator::{alt, delimited, eof, opt, preceded, terminated};
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::{any, take_until, take_while};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Block<'a> {
    /// Opening or closing ```` ``` ````, with the language tag if any
    Fence(&'a str),
    Rule,
    Heading(usize),
    Bullet(&'a str),
    Numbered(&'a str, &'a str),
    Quote,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Span<'a> {
    Text(&'a str),
    Code(&'a str),
    Bold(&'a str),
    Italic(&'a str),
}

/// Render markdown to a terminal
pub fn render_markdown(out: &mut impl Write, markdown: &str) -> Result<()> {
    let mut in_code = false;

    for line in markdown.lines() {
        if in_code {
            if fence.parse_peek(line).is_ok() {
                in_code = false;
            } else {
                writeln!(out, "    {}", line.green())?;
            }
            continue;
        }

        let mut rest = line;
        match opt(block).parse_next(&mut rest).ok().flatten() {
            Some(Block::Fence(lang)) => {
                in_code = true;
                if !lang.is_empty() {
                    writeln!(out, "{}", format!("  [{}]", lang).dark_grey())?;
                }
                continue;
            }
            Some(Block::Rule) => {
                writeln!(out, "{}", "━".repeat(40).dark_grey())?;
                continue;
            }
            Some(Block::Heading(1)) => {
                writeln!(out, "{}", rest.trim().to_uppercase().bold().underlined())?;
                continue;
            }
            Some(Block::Heading(_)) => {
                writeln!(out, "{}", rest.trim().bold().cyan())?;
                continue;
            }
            Some(Block::Bullet(indent)) => write!(out, "{}  • ", indent)?,
            Some(Block::Numbered(indent, n)) => write!(out, "{}  {}. ", indent, n)?,
            Some(Block::Quote) => write!(out, "{}", "│ ".dark_grey())?,
            None => {}
        }

        write_inline(out, rest)?;
        writeln!(out)?;
    }

    Ok(())
}

fn write_inline(out: &mut impl Write, mut input: &str) -> Result<()> {
    let mut prev: Option<char> = None;

    while !input.is_empty() {
        let before = input;
        // `_` only opens emphasis at a word start, so snake_case stays intact
        let word_start = prev.map_or(true, |c| !c.is_alphanumeric());
        let parsed = if word_start {
            alt((code, bold, italic_star, italic_underscore, text, literal)).parse_next(&mut input)
        } else {
            alt((code, bold, italic_star, text, literal)).parse_next(&mut input)
        };
        let Ok(span) = parsed else {
            write!(out, "{}", input)?;
            break;
        };
        prev = before[..before.len() - input.len()].chars().last();

        match span {
            Span::Text(t) => write!(out, "{}", t)?,
            Span::Code(t) => write!(out, "{}", t.green())?,
            Span::Bold(t) => write!(out, "{}", t.bold())?,
            Span::Italic(t) => write!(out, "{}", t.italic())?,
        }
    }

    Ok(())
}

fn block<'a>(i: &mut &'a str) -> ModalResult<Block<'a>> {
    alt((fence, rule, heading, bullet, numbered, quote)).parse_next(i)
}

fn fence<'a>(i: &mut &'a str) -> ModalResult<Block<'a>> {
    preceded((space0, "```"), till_line_ending)
        .map(|lang: &str| Block::Fence(lang.trim()))
        .parse_next(i)
}

fn rule<'a>(i: &mut &'a str) -> ModalResult<Block<'a>> {
    (
        space0,
        alt((take_while(3.., '-'), take_while(3.., '*'), take_while(3.., '_'))),
        space0,
        eof,
    )
        .value(Block::Rule)
        .parse_next(i)
}

fn heading<'a>(i: &mut &'a str) -> ModalResult<Block<'a>> {
    terminated(take_while(1..=6, '#'), space1)
        .map(|hashes: &str| Block::Heading(hashes.len()))
        .parse_next(i)
}

fn bullet<'a>(i: &mut &'a str) -> ModalResult<Block<'a>> {
    terminated(space0, (alt(("-", "*", "+")), space1))
        .map(Block::Bullet)
        .parse_next(i)
}

fn numbered<'a>(i: &mut &'a str) -> ModalResult<Block<'a>> {
    (space0, digit1, alt((".", ")")), space1)
        .map(|(indent, n, _, _)| Block::Numbered(indent, n))
        .parse_next(i)
}

fn quote<'a>(i: &mut &'a str) -> ModalResult<Block<'a>> {
    preceded(space0, (">", space0)).value(Block::Quote).parse_next(i)
}

fn code<'a>(i: &mut &'a str) -> ModalResult<Span<'a>> {
    delimited("`", take_until(1.., "`"), "`").map(Span::Code).parse_next(i)
}

fn bold<'a>(i: &mut &'a str) -> ModalResult<Span<'a>> {
    alt((
        delimited("**", take_until(1.., "**"), "**"),
        delimited("__", take_until(1.., "__"), "__"),
    ))
    .map(Span::Bold)
    .parse_next(i)
}

fn italic_star<'a>(i: &mut &'a str) -> ModalResult<Span<'a>> {
    delimited("*", take_until(1.., "*"), "*").map(Span::Italic).parse_next(i)
}

fn italic_underscore<'a>(i: &mut &'a str) -> ModalResult<Span<'a>> {
    delimited("_", take_until(1.., "_"), "_").map(Span::Italic).parse_next(i)
}

fn text<'a>(i: &mut &'a str) -> ModalResult<Span<'a>> {
    take_while(1.., |c: char| !matches!(c, '`' | '*' | '_'))
        .map(Span::Text)
        .parse_next(i)
}

/// A marker that opened nothing is printed as is
fn literal<'a>(i: &mut &'a str) -> ModalResult<Span<'a>> {
    any.take().map(Span::Text).parse_next(i)
}
