//! Blanks out comments and string literals so pattern matching only sees code.
//!
//! Every character is replaced by exactly one space, so character columns in
//! the output line up with the original text.

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    BlockComment,
    Str(char),
    Verbatim(char),
}

pub(crate) fn sanitize(content: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut state = State::Code;

    for line in content.lines() {
        let chars: Vec<char> = line.chars().collect();
        let mut buf = String::with_capacity(line.len());
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            let next = chars.get(i + 1).copied();
            match state {
                State::Code => match (c, next) {
                    ('/', Some('/')) => {
                        buf.extend(std::iter::repeat_n(' ', chars.len() - i));
                        i = chars.len();
                    }
                    ('/', Some('*')) => {
                        state = State::BlockComment;
                        buf.push_str("  ");
                        i += 2;
                    }
                    ('@', Some(q @ ('"' | '\''))) => {
                        state = State::Verbatim(q);
                        buf.push_str("  ");
                        i += 2;
                    }
                    ('"' | '\'', _) => {
                        state = State::Str(c);
                        buf.push(' ');
                        i += 1;
                    }
                    _ => {
                        buf.push(c);
                        i += 1;
                    }
                },
                State::BlockComment => {
                    if c == '*' && next == Some('/') {
                        state = State::Code;
                        buf.push_str("  ");
                        i += 2;
                    } else {
                        buf.push(' ');
                        i += 1;
                    }
                }
                State::Str(quote) => {
                    if c == '\\' {
                        buf.push(' ');
                        if next.is_some() {
                            buf.push(' ');
                        }
                        i += 2;
                    } else {
                        if c == quote {
                            state = State::Code;
                        }
                        buf.push(' ');
                        i += 1;
                    }
                }
                State::Verbatim(quote) => {
                    if c == quote {
                        state = State::Code;
                    }
                    buf.push(' ');
                    i += 1;
                }
            }
        }

        // Plain strings never continue past the end of a line.
        if let State::Str(_) = state {
            state = State::Code;
        }
        out.push(buf);
    }

    out
}
