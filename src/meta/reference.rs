/// Join-table coordinates for a many-to-many relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTable {
    pub table: String,
    pub local_column: String,
    pub target_column: String,
}

/// A parsed relation reference.
///
/// `local_field` is the owner-side field whose value drives the load;
/// `column` is the target-side join column the value is matched against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub local_field: String,
    pub column: String,
    pub join_table: Option<JoinTable>,
}

impl Reference {
    /// Parse a reference string. Three grammars are accepted:
    ///
    /// - `"column"` — shorthand for `id(column)`
    /// - `"local_field(column)"`
    /// - `"join_table(local_column, target_column)"` — many-to-many
    ///
    /// Anything else yields `None`, which callers must treat as fatal for
    /// that relation.
    pub fn parse(reference: &str) -> Option<Reference> {
        let reference = reference.trim();

        match split_call(reference)? {
            (word, None) => Some(Reference {
                local_field: "id".to_string(),
                column: word.to_string(),
                join_table: None,
            }),
            (head, Some(args)) => match args.len() {
                1 => Some(Reference {
                    local_field: head.to_string(),
                    column: args[0].to_string(),
                    join_table: None,
                }),
                2 => Some(Reference {
                    local_field: "id".to_string(),
                    column: "id".to_string(),
                    join_table: Some(JoinTable {
                        table: head.to_string(),
                        local_column: args[0].to_string(),
                        target_column: args[1].to_string(),
                    }),
                }),
                _ => None,
            },
        }
    }
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Split `head(arg, arg)` shapes; a bare word comes back with no arg list.
fn split_call(s: &str) -> Option<(&str, Option<Vec<&str>>)> {
    if is_word(s) {
        return Some((s, None));
    }

    let open = s.find('(')?;
    let head = s[..open].trim_end();
    let rest = &s[open + 1..];
    let close = rest.rfind(')')?;
    if !rest[close + 1..].trim().is_empty() || !is_word(head) {
        return None;
    }

    let args: Vec<&str> = rest[..close].split(',').map(str::trim).collect();
    if args.iter().all(|arg| is_word(arg)) {
        Some((head, Some(args)))
    } else {
        None
    }
}
