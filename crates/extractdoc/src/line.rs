use std::io::{self, BufRead};

#[derive(Debug, Clone)]
pub struct LineRecord {
    /// 1-based line number within the source file.
    pub number: usize,
    pub text: String,
}

pub fn read_lines<R: BufRead>(reader: &mut R) -> io::Result<Vec<LineRecord>> {
    let mut lines = Vec::new();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = reader.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }

        let mut line = buffer.clone();

        if line.ends_with('\n') {
            line.pop();

            if line.ends_with('\r') {
                line.pop();
            }
        }

        lines.push(LineRecord {
            number: lines.len() + 1,
            text: line,
        });
    }

    Ok(lines)
}
