//!Case-transfer helpers: copy the casing pattern of an input string onto a
//!corrected string, either position for position (equal lengths) or through a
//!character alignment (differing lengths).

///Copy each source character's case onto the target character at the same
///position. Intended for equal-length pairs; leftover target characters are
///appended unchanged. Non-letter characters pass through as-is.
pub fn transfer_casing_matching(source: &str, target: &str) -> String {
    let mut output = String::with_capacity(target.len());
    let mut source_chars = source.chars();
    for target_char in target.chars() {
        match source_chars.next() {
            Some(source_char) => push_cased(&mut output, source_char, target_char),
            None => output.push(target_char),
        }
    }
    output
}

///Copy the casing pattern of `source` onto a `target` of (possibly) different
///length. Characters are paired through a minimal edit alignment: aligned
///characters copy their case, source characters the alignment deletes are
///skipped, extra target characters take the sticky case of the neighbouring
///source character (uppercase persists until a lowercase source character
///resets it; at a word start the next source character is peeked instead).
pub fn transfer_casing_similar(source: &str, target: &str) -> String {
    if source.is_empty() || target.is_empty() {
        return target.to_string();
    }
    let source_chars: Vec<char> = source.chars().collect();
    let target_chars: Vec<char> = target.chars().collect();
    let ops = align(&source_chars, &target_chars);

    let mut output = String::with_capacity(target.len());
    let mut source_at = 0;
    let mut target_at = 0;
    for op in ops {
        match op {
            AlignOp::Keep => {
                push_cased(&mut output, source_chars[source_at], target_chars[target_at]);
                source_at += 1;
                target_at += 1;
            }
            AlignOp::Skip => {
                source_at += 1;
            }
            AlignOp::Extra => {
                let anchor = if source_at > 0 && !source_chars[source_at - 1].is_whitespace() {
                    Some(source_chars[source_at - 1])
                } else if source_at < source_chars.len() {
                    Some(source_chars[source_at])
                } else {
                    source_chars.last().copied()
                };
                match anchor {
                    Some(c) => push_cased(&mut output, c, target_chars[target_at]),
                    None => output.push(target_chars[target_at]),
                }
                target_at += 1;
            }
        }
    }
    output
}

fn push_cased(output: &mut String, source_char: char, target_char: char) {
    if source_char.is_uppercase() {
        output.extend(target_char.to_uppercase());
    } else if source_char.is_lowercase() {
        output.extend(target_char.to_lowercase());
    } else {
        output.push(target_char);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AlignOp {
    ///Source and target characters are aligned (equal or substituted)
    Keep,
    ///Source character has no counterpart in the target
    Skip,
    ///Target character has no counterpart in the source
    Extra,
}

fn chars_match(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

///Minimal case-insensitive edit alignment between source and target,
///as a sequence of operations walking both strings front to back
fn align(source: &[char], target: &[char]) -> Vec<AlignOp> {
    let rows = source.len() + 1;
    let columns = target.len() + 1;
    let mut matrix = vec![0usize; rows * columns];
    for i in 0..rows {
        matrix[i * columns] = i;
    }
    for j in 0..columns {
        matrix[j] = j;
    }
    for i in 1..rows {
        for j in 1..columns {
            let cost = if chars_match(source[i - 1], target[j - 1]) {
                0
            } else {
                1
            };
            matrix[i * columns + j] = (matrix[(i - 1) * columns + j] + 1)
                .min(matrix[i * columns + j - 1] + 1)
                .min(matrix[(i - 1) * columns + j - 1] + cost);
        }
    }

    let mut ops = Vec::with_capacity(source.len().max(target.len()));
    let mut i = rows - 1;
    let mut j = columns - 1;
    while i > 0 || j > 0 {
        if i > 0 && j > 0 {
            let cost = if chars_match(source[i - 1], target[j - 1]) {
                0
            } else {
                1
            };
            if matrix[i * columns + j] == matrix[(i - 1) * columns + j - 1] + cost {
                ops.push(AlignOp::Keep);
                i -= 1;
                j -= 1;
                continue;
            }
        }
        if i > 0 && matrix[i * columns + j] == matrix[(i - 1) * columns + j] + 1 {
            ops.push(AlignOp::Skip);
            i -= 1;
        } else {
            ops.push(AlignOp::Extra);
            j -= 1;
        }
    }
    ops.reverse();
    ops
}
