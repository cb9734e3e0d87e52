//! Identifier case transforms between the external (camelCase) shape used by
//! application records and the storage (snake_case) shape used for column names.
//!
//! The two transforms are best-effort inverses for the identifier shapes that show
//! up in schema declarations: single words and simple camelCase (`homeId` ⇄
//! `home_id`). They are **not** exact inverses for names containing digits, leading
//! underscores, or consecutive separators; those edge cases are left as-is rather
//! than guessed at.

/// Convert a camelCase identifier to snake_case.
///
/// Every ASCII uppercase character becomes `_` followed by its lowercase form; a
/// leading `_` produced by an uppercase first character is stripped. Names without
/// uppercase characters pass through unchanged.
pub fn to_snake_case(name: &str) -> String {
    if !name.chars().any(|c| c.is_ascii_uppercase()) {
        return name.to_string();
    }

    let mut snake = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            snake.push('_');
            snake.push(c.to_ascii_lowercase());
        } else {
            snake.push(c);
        }
    }

    snake.strip_prefix('_').map(str::to_string).unwrap_or(snake)
}

/// Convert a snake_case (or space-separated) identifier to camelCase.
///
/// Every `_x` or ` x` (a separator followed by a lowercase letter) becomes the
/// uppercased letter with the separator removed. Names without such a pattern pass
/// through unchanged.
pub fn to_camel_case(name: &str) -> String {
    let mut camel = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '_' || c == ' ' {
            if let Some(&next) = chars.peek() {
                if next.is_ascii_lowercase() {
                    chars.next();
                    camel.push(next.to_ascii_uppercase());
                    continue;
                }
            }
        }
        camel.push(c);
    }

    camel
}
