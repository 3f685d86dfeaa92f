//! Minimal wildcard matching shared by path and origin patterns.
//!
//! `*` matches any run of characters (including none), `?` exactly one character.
//! Callers decide what a "unit" is (one path segment, one whole origin).

pub fn matches(pattern: &str, text: &str) -> bool {
    let glob: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut g, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match glob.get(g) {
            Some('*') => {
                star = Some((g, t));
                g += 1;
            }
            Some('?') => {
                g += 1;
                t += 1;
            }
            Some(c) if *c == text[t] => {
                g += 1;
                t += 1;
            }
            _ => match star {
                // Let the last star swallow one more character and retry.
                Some((sg, st)) => {
                    g = sg + 1;
                    t = st + 1;
                    star = Some((sg, st + 1));
                }
                None => return false,
            },
        }
    }

    glob[g..].iter().all(|c| *c == '*')
}
