//! Pretty printer for request bodies.
//!
//! Objects put every field on its own line, indented per object nesting level,
//! with ` : ` between key and value. Arrays stay inline (`[ 2, 3 ]`) and do
//! not add an indentation level, so a list of objects renders as
//! `[ {\n  "a" : 1\n}, {\n  "b" : 2\n} ]`. Empty containers render as `{ }`
//! and `[ ]`.

use std::io;

use serde_json::ser::Formatter;

#[derive(Debug, Clone)]
pub struct SpacedPrettyFormatter {
    indent_width: usize,
    depth: usize,
    has_value: bool,
}

impl SpacedPrettyFormatter {
    pub fn new() -> Self {
        Self::with_indent_width(2)
    }

    pub fn with_indent_width(indent_width: usize) -> Self {
        Self {
            indent_width,
            depth: 0,
            has_value: false,
        }
    }

    fn newline<W: ?Sized + io::Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b"\n")?;
        for _ in 0..self.depth * self.indent_width {
            writer.write_all(b" ")?;
        }
        Ok(())
    }
}

impl Default for SpacedPrettyFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for SpacedPrettyFormatter {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.has_value = false;
        writer.write_all(b"[")
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b" ]")
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            writer.write_all(b" ")
        } else {
            writer.write_all(b", ")
        }
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.depth += 1;
        self.has_value = false;
        writer.write_all(b"{")
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.depth -= 1;
        if self.has_value {
            self.newline(writer)?;
        } else {
            writer.write_all(b" ")?;
        }
        writer.write_all(b"}")
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if !first {
            writer.write_all(b",")?;
        }
        self.newline(writer)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b" : ")
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }
}
