use std::collections::VecDeque;
use std::io::{self, BufRead};

/// Hands out whitespace-delimited words, or whole lines, from one
/// line-buffered reader.
pub(crate) struct WordReader<R> {
    input: R,
    pending: VecDeque<String>,
}

impl<R: BufRead> WordReader<R> {
    pub(crate) fn new(input: R) -> Self {
        WordReader { input, pending: VecDeque::new() }
    }

    /// `None` once the underlying reader is exhausted.
    pub(crate) fn next_word(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(word) = self.pending.pop_front() {
                return Ok(Some(word));
            }
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.pending.extend(line.split_whitespace().map(String::from));
        }
    }

    /// The rest of a partly consumed line, otherwise the next full line.
    pub(crate) fn next_line(&mut self) -> io::Result<Option<String>> {
        if !self.pending.is_empty() {
            let rest: Vec<String> = self.pending.drain(..).collect();
            return Ok(Some(rest.join(" ")));
        }
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_any_whitespace_across_lines() -> io::Result<()> {
        let mut words = WordReader::new("  one two\n\n\tthree  \nfour".as_bytes());
        let mut seen = Vec::new();
        while let Some(word) = words.next_word()? {
            seen.push(word);
        }
        assert_eq!(vec!["one", "two", "three", "four"], seen);
        Ok(())
    }

    #[test]
    fn lines_and_words_share_one_buffer() -> io::Result<()> {
        let mut words = WordReader::new("read(x);\n5 six\nwrite(x);\n".as_bytes());
        assert_eq!(Some("read(x);\n".to_string()), words.next_line()?);
        assert_eq!(Some("5".to_string()), words.next_word()?);
        assert_eq!(Some("six".to_string()), words.next_line()?);
        assert_eq!(Some("write(x);\n".to_string()), words.next_line()?);
        assert_eq!(None, words.next_line()?);
        Ok(())
    }

    #[test]
    fn empty_input_has_no_words() -> io::Result<()> {
        let mut words = WordReader::new(" \n \n".as_bytes());
        assert_eq!(None, words.next_word()?);
        Ok(())
    }
}
