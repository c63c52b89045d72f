use std::collections::BTreeMap;

/// Class index to label mapping.
///
/// Indices without an entry resolve to their decimal string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassNames {
    names: BTreeMap<usize, String>,
}

impl ClassNames {
    pub fn from_list<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .map(Into::into)
                .enumerate()
                .collect(),
        }
    }

    /// Parse the `names` entry Ultralytics writes into exported model metadata,
    /// e.g. `{0: 'healthy', 1: 'defective'}`.
    ///
    /// Returns `None` when nothing could be parsed.
    pub fn parse_metadata(raw: &str) -> Option<Self> {
        let body = raw.trim().strip_prefix('{')?.strip_suffix('}')?;
        let mut names = BTreeMap::new();
        let mut rest = body;

        loop {
            rest = rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
            if rest.is_empty() {
                break;
            }

            let colon = rest.find(':')?;
            let index: usize = rest[..colon].trim().trim_matches(['\'', '"']).parse().ok()?;
            rest = rest[colon + 1..].trim_start();

            let quote = rest.chars().next().filter(|c| *c == '\'' || *c == '"')?;
            let value = &rest[1..];
            let end = value.find(quote)?;
            names.insert(index, value[..end].to_string());
            rest = &value[end + 1..];
        }

        if names.is_empty() {
            None
        } else {
            Some(Self { names })
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn label(&self, class_id: usize) -> String {
        self.names
            .get(&class_id)
            .filter(|name| !name.is_empty())
            .cloned()
            .unwrap_or_else(|| class_id.to_string())
    }
}
