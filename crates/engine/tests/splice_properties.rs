use nodepatch_engine::{apply_edits, repair, validate, NodeEdit, Violation};
use nodepatch_markup_index::{index_source, IndexerConfig, StructuralFingerprint};
use pretty_assertions::assert_eq;

const SECTIONS: &str = "export const Header = () =>
  <h1>Title</h1>;

function helper(a) {
  return a + 1;
}

// body
export const Body = () => (
  <section>
    Text
  </section>
);

const x = 1;
const y = 2;


export const Footer = () =>
  <footer>Bye</footer>;
";

#[test]
fn spans_at_two_ten_and_twenty() {
    let nodes = index_source("Sections.jsx", SECTIONS, &IndexerConfig::default());
    let spans: Vec<(usize, usize)> = nodes.iter().map(|n| (n.span.start_line, n.span.end_line)).collect();
    assert_eq!(spans, vec![(2, 2), (10, 12), (20, 20)]);
}

#[test]
fn edits_of_different_sizes_never_shift_each_other() {
    let nodes = index_source("Sections.jsx", SECTIONS, &IndexerConfig::default());
    let edits = vec![
        NodeEdit::new("node_1", "  <h1>\n    Title\n  </h1>;"),
        NodeEdit::new("node_2", "  <section>Text</section>"),
        NodeEdit::new("node_3", "  <footer>\n    Bye</footer>;"),
    ];
    let result = apply_edits(SECTIONS, &nodes, &edits);

    let expected = "export const Header = () =>
  <h1>
    Title
  </h1>;

function helper(a) {
  return a + 1;
}

// body
export const Body = () => (
  <section>Text</section>
);

const x = 1;
const y = 2;


export const Footer = () =>
  <footer>
    Bye</footer>;
";
    assert_eq!(result.content, expected);
    assert_eq!(result.applied_count, 3);
}

#[test]
fn edit_order_in_the_plan_does_not_matter() {
    let nodes = index_source("Sections.jsx", SECTIONS, &IndexerConfig::default());
    let forward = vec![
        NodeEdit::new("node_1", "  <h2>Title</h2>;"),
        NodeEdit::new("node_3", "  <footer />;"),
    ];
    let mut backward = forward.clone();
    backward.reverse();
    assert_eq!(
        apply_edits(SECTIONS, &nodes, &forward).content,
        apply_edits(SECTIONS, &nodes, &backward).content
    );
}

const PROFILE: &str = r#"import React from 'react';
import { Avatar } from './Avatar';
import styles from './Profile.module.css';

function Profile({ user }) {
  return (
    <div className={styles.card}>
      <Avatar src={user.avatar} />
      <h2>{user.name}</h2>
    </div>
  );
}

export default Profile;
"#;

#[test]
fn removed_default_export_is_repaired_in_place() {
    let fingerprint = StructuralFingerprint::extract(PROFILE);
    let patched = PROFILE
        .replace("      <h2>{user.name}</h2>", "      <h3>{user.name}</h3>")
        .replace("export default Profile;\n", "");

    let report = validate(&patched, &fingerprint);
    assert_eq!(
        report.violations,
        vec![
            Violation::MissingExport("export default Profile;".into()),
            Violation::MissingDefaultExport
        ]
    );

    let repaired = repair(&patched, &fingerprint, PROFILE, &[9..=9]).expect("repairable");
    assert!(validate(&repaired, &fingerprint).is_valid());
    assert_eq!(repaired, PROFILE.replace("<h2>{user.name}</h2>", "<h3>{user.name}</h3>"));
}
