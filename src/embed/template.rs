//! Template types for typed variable injection.

use std::borrow::Cow;
use std::marker::PhantomData;

/// Trait for template variable sets.
pub trait TemplateVars {
    /// Placeholder → value pairs, e.g. `("__HTML__", html)`.
    fn pairs(&self) -> Vec<(&'static str, Cow<'_, str>)>;
}

/// Template with typed variable injection.
///
/// Substitution is a single pass over the template, so placeholder-like
/// text inside an injected value is never substituted again.
#[derive(Debug, Clone, Copy)]
pub struct Template<V> {
    content: &'static str,
    _marker: PhantomData<V>,
}

impl<V> Template<V> {
    pub const fn new(content: &'static str) -> Self {
        Self {
            content,
            _marker: PhantomData,
        }
    }

    pub const fn content(&self) -> &'static str {
        self.content
    }
}

impl<V: TemplateVars> Template<V> {
    pub fn render(&self, vars: &V) -> String {
        let pairs = vars.pairs();
        let mut out = String::with_capacity(
            self.content.len() + pairs.iter().map(|(_, v)| v.len()).sum::<usize>(),
        );

        let mut rest = self.content;
        loop {
            let next = pairs
                .iter()
                .filter_map(|(key, value)| rest.find(key).map(|at| (at, *key, value)))
                .min_by_key(|(at, _, _)| *at);

            match next {
                Some((at, key, value)) => {
                    out.push_str(&rest[..at]);
                    out.push_str(value);
                    rest = &rest[at + key.len()..];
                }
                None => {
                    out.push_str(rest);
                    return out;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Greeting<'a> {
        name: &'a str,
        place: &'a str,
    }

    impl TemplateVars for Greeting<'_> {
        fn pairs(&self) -> Vec<(&'static str, Cow<'_, str>)> {
            vec![
                ("__NAME__", Cow::Borrowed(self.name)),
                ("__PLACE__", Cow::Borrowed(self.place)),
            ]
        }
    }

    const GREETING: Template<Greeting<'static>> = Template::new("hi __NAME__ from __PLACE__, __NAME__!");

    #[test]
    fn test_render_all_occurrences() {
        let out = GREETING.render(&Greeting {
            name: "ada",
            place: "home",
        });
        assert_eq!(out, "hi ada from home, ada!");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let out = GREETING.render(&Greeting {
            name: "__PLACE__",
            place: "x",
        });
        assert_eq!(out, "hi __PLACE__ from x, __PLACE__!");
    }
}
