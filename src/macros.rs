/// Compile a regex literal once and hand out a `&'static Regex`.
#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Build a [`TokenPattern`](crate::TokenPattern) from attribute/value pairs.
///
/// ```ignore
/// let p = token!(Lower = "history", Pos = "NOUN");
/// ```
#[macro_export]
macro_rules! token {
    () => {
        $crate::TokenPattern::any()
    };
    ($($attr:ident = $value:expr),+ $(,)?) => {{
        $crate::TokenPattern::any()
            $(.with_attr($crate::TokenAttr::$attr, $crate::AttrPredicate::Equals(($value).to_string())))+
    }};
}
