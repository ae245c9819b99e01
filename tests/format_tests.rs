use gita_guide::format::{
  format, normalize_headings, split_points, strip_emphasis,
  FormatOptions, FormatPolicy, FormattedGuidance,
};

fn plain() -> FormatOptions
{   FormatOptions
    {   policy: FormatPolicy::PlainStrip
      , normalize_headings: false
    }
}

fn points() -> FormatOptions
{   FormatOptions
    {   policy: FormatPolicy::PointWise
      , normalize_headings: false
    }
}

#[test]
fn test_plain_strip_removes_emphasis_and_keeps_newlines()
{   let raw = "**You Are Not Alone**\n\nIt is **normal** to feel this way.";
    assert_eq!(
      format(raw, &plain()),
      FormattedGuidance::Text(
        "You Are Not Alone\n\nIt is normal to feel this way.".to_string()
      )
    );
}

#[test]
fn test_plain_strip_without_markers_is_identity()
{   let samples = [
      ""
    , "Hello\nWorld"
    , "  leading and trailing  "
    , "Step 1: breathe.\n- bullet * single star"
    , "### kept heading"
    ];
    for s in samples
    {   assert_eq!(format(s, &plain()), FormattedGuidance::Text(s.to_string()));
    }
}

#[test]
fn test_unbalanced_marker_is_still_removed()
{   assert_eq!(strip_emphasis("a **b** c **d"), "a b c d");
    assert_eq!(strip_emphasis("***"), "*");
}

#[test]
fn test_point_wise_splits_labels_and_colons()
{   let raw = "**Point One:** Breathe. **Point Two:** Reflect.";
    assert_eq!(
      format(raw, &points()),
      FormattedGuidance::Points(vec![
        "Point One:".to_string(),
        "Breathe.".to_string(),
        "Point Two:".to_string(),
        "Reflect.".to_string(),
      ])
    );
}

#[test]
fn test_point_wise_without_colons_is_single_segment()
{   assert_eq!(
      split_points("  Just breathe and be still.  "),
      vec!["Just breathe and be still.".to_string()]
    );
}

#[test]
fn test_point_wise_drops_blank_lines_and_trims()
{   let raw = "Steps:\n\n  - walk  \n\n  - rest\n";
    assert_eq!(
      split_points(raw),
      vec!["Steps:".to_string(), "- walk".to_string(), "- rest".to_string()]
    );
}

#[test]
fn test_point_wise_inline_emphasis_does_not_split()
{   assert_eq!(
      split_points("Practice **patience** daily."),
      vec!["Practice patience daily.".to_string()]
    );
}

#[test]
fn test_point_wise_empty_input_yields_no_points()
{   assert!(split_points("").is_empty());
    assert!(split_points(" \n\t\n").is_empty());
    assert!(format("**", &points()).is_empty());
}

#[test]
fn test_point_wise_lines_reproduce_segments()
{   let raw = "Gita Insight: act without attachment.\n\nWhat You Can Do Today:\n- Walk\n- Write:  three lines";
    let segments = split_points(raw);
    let rejoined = segments.join("\n");
    let reparsed: Vec<String> = rejoined
      .lines()
      .map(str::trim)
      .filter(|l| !l.is_empty())
      .map(str::to_string)
      .collect();
    assert_eq!(reparsed, segments);
}

#[test]
fn test_point_wise_matches_trimmed_source_lines()
{   let raw = "  You are not alone.\n\n- Walk in the morning  \n\t- Write three lines\n\nStay steady.  ";
    let source_lines: Vec<String> = raw
      .lines()
      .map(str::trim)
      .filter(|l| !l.is_empty())
      .map(str::to_string)
      .collect();

    let segments = split_points(raw);
    assert_eq!(segments, source_lines);

    let rejoined: Vec<String> = segments.join("\n")
      .lines()
      .map(str::trim)
      .filter(|l| !l.is_empty())
      .map(str::to_string)
      .collect();
    assert_eq!(rejoined, source_lines);
}

#[test]
fn test_heading_normalization()
{   let raw = "### Gita Insight\nbody\n#### Deeper\n###NoSpace\n  ### indented";
    assert_eq!(
      normalize_headings(raw),
      "─ Gita Insight ─\nbody\n#### Deeper\n###NoSpace\n  ### indented"
    );
}

#[test]
fn test_heading_normalization_runs_before_stripping()
{   let options = FormatOptions
    {   policy: FormatPolicy::PlainStrip
      , normalize_headings: true
    };
    assert_eq!(
      format("### **Final Thought**  \nStay steady.", &options),
      FormattedGuidance::Text("─ Final Thought ─\nStay steady.".to_string())
    );
}

#[test]
fn test_clipboard_text_and_lines()
{   let text = FormattedGuidance::Text("Hello\nWorld".to_string());
    assert_eq!(text.clipboard_text(), "Hello\nWorld");

    let pts = FormattedGuidance::Points(vec!["a:".to_string(), "b".to_string()]);
    assert_eq!(pts.clipboard_text(), "a:\nb");
    let first: Vec<&str> = pts.lines().collect();
    let second: Vec<&str> = pts.lines().collect();
    assert_eq!(first, vec!["a:", "b"]);
    assert_eq!(first, second);
}
