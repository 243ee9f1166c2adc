use unimatch::{Doc, MatchRun, Matcher, Span};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        /// `━━━ Title ━━━` header line, preceded by a blank line.
        pub fn section(&self, title: &str) -> String {
            format!("\n{}", self.paint(format!("━━━ {title} ━━━"), GRAY))
        }

        /// Rule id followed by its category, e.g. `NEGATION_0 (NEGATION)`.
        pub fn label(&self, rule_id: &str, category: Option<&str>) -> String {
            match category {
                Some(category) => format!("{} {}", self.paint(rule_id, CYAN), self.paint(format!("({category})"), BLUE)),
                None => self.paint(rule_id, CYAN),
            }
        }
    }
}

pub fn print_run(matcher: &Matcher, doc: &Doc, run: &MatchRun, spans: &[Span<'_>], color: bool) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Matching: \"{}\"", doc.text().trim_end()), ansi::CYAN)));

    println!("{}", palette.section("Tokens"));
    print_tokens(doc, &palette);

    println!("{}", palette.section("Engines"));
    print_engines(matcher, doc, run, &palette);

    println!("{}", palette.section("Results"));
    if spans.is_empty() {
        println!("{}", palette.dim("  No matches"));
        println!("\n{}", palette.paint("Possible reasons:", ansi::YELLOW));
        println!("  • Phrase tokens differ from document tokens on the compared attribute");
        println!("  • Regex hits did not align to token boundaries");
        println!("\n{}", palette.dim("  Tip: Set RUST_LOG=unimatch=trace to see engine and pruning details"));
    } else {
        print_spans(spans, &palette);
    }

    println!("{}", palette.section("Timing"));
    let engines_total: std::time::Duration = run.metrics.engines.iter().map(|e| e.duration).sum();
    let prune = run
        .metrics
        .prune
        .as_ref()
        .map(|p| format!("{:?} ({} passes, {} removed)", p.duration, p.passes, p.removed))
        .unwrap_or_else(|| "disabled".to_string());
    println!(
        "  Total: {}  │  Engines: {}  │  Prune: {}",
        palette.paint(format!("{:?}", run.metrics.total), ansi::GREEN),
        palette.paint(format!("{:?}", engines_total), ansi::CYAN),
        palette.dim(prune),
    );
    println!();
}

fn print_tokens(doc: &Doc, palette: &ansi::Palette) {
    let line: Vec<String> = doc
        .tokens()
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{}{}", palette.dim(format!("{i}:")), t.text()))
        .collect();
    println!("  {}", line.join(" "));
}

fn print_engines(matcher: &Matcher, doc: &Doc, run: &MatchRun, palette: &ansi::Palette) {
    let mut offset = 0;
    for engine in &run.metrics.engines {
        println!(
            "  {} {}  {}",
            palette.paint(format!("{}:", engine.engine.name()), ansi::BLUE),
            if engine.produced > 0 {
                palette.paint(format!("✓ {} matches", engine.produced), ansi::GREEN)
            } else {
                palette.dim(format!("✗ {} matches", engine.produced))
            },
            palette.dim(format!("{:?}", engine.duration)),
        );
        for m in &run.raw[offset..offset + engine.produced] {
            let category = matcher.rule(m.rule_id().as_str()).map(|r| r.category());
            println!(
                "    {} {} {}",
                palette.paint(format!("{}..{}", m.start(), m.end()), ansi::YELLOW),
                palette.label(m.rule_id().as_str(), category),
                palette.dim(doc.span_text(m.start(), m.end())),
            );
        }
        offset += engine.produced;
    }
}

fn print_spans(spans: &[Span<'_>], palette: &ansi::Palette) {
    for (idx, span) in spans.iter().enumerate() {
        println!(
            "  {} {} {} {}",
            palette.paint(format!("[{}]", idx), ansi::GRAY),
            palette.bold(palette.paint(span.text(), ansi::GREEN)),
            palette.dim("│"),
            palette.paint(format!("tokens {}..{}", span.start, span.end), ansi::YELLOW),
        );
        println!("      {} {}", palette.dim("rule:"), palette.label(span.rule_id.as_str(), span.label.as_deref()));
    }
}

#[cfg(test)]
mod tests {
    use super::ansi::Palette;

    #[test]
    fn plain_palette_renders_sections_and_labels() {
        let palette = Palette::new(false);
        assert_eq!(palette.section("Results"), "\n━━━ Results ━━━");
        assert_eq!(palette.label("NEGATION_0", Some("NEGATION")), "NEGATION_0 (NEGATION)");
        assert_eq!(palette.label("X_3", None), "X_3");
    }

    #[test]
    fn colored_palette_wraps_in_escape_codes() {
        let palette = Palette::new(true);
        assert_eq!(palette.dim("x"), "\x1b[2mx\x1b[0m");
    }
}
