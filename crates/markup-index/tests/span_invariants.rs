use nodepatch_markup_index::{index_source, IndexerConfig, MarkupNode};

const NAVBAR: &str = r#"import React, { useState } from 'react';
import { Link } from 'react-router-dom';

export default function Navbar({ user, onLogout }) {
  const [open, setOpen] = useState(false);

  return (
    <nav className="navbar">
      <Link to="/" className="brand">Acme</Link>
      <ul className={open ? 'menu open' : 'menu'}>
        <li><Link to="/pricing">Pricing</Link></li>
        <li><Link to="/docs">Docs</Link></li>
        {user ? (
          <li>
            <button onClick={onLogout}>
              Log out
            </button>
          </li>
        ) : (
          <li><Link to="/login">Sign In</Link></li>
        )}
      </ul>
      <img src="/logo.svg" alt="logo" />
    </nav>
  );
}
"#;

fn nodes() -> Vec<MarkupNode> {
    index_source("src/Navbar.jsx", NAVBAR, &IndexerConfig::default())
}

#[test]
fn snippet_equals_source_lines_for_every_node() {
    let lines: Vec<&str> = NAVBAR.split('\n').collect();
    let nodes = nodes();
    assert!(nodes.len() >= 12, "expected every element indexed, got {}", nodes.len());

    for node in &nodes {
        let expected = lines[node.span.start_line - 1..node.span.end_line].join("\n");
        assert_eq!(node.code_snippet, expected, "snippet mismatch for {}", node.id);
    }
}

#[test]
fn nodes_are_ordered_and_never_partially_overlap() {
    let nodes = nodes();
    for pair in nodes.windows(2) {
        assert!(pair[0].span.start_line <= pair[1].span.start_line);
    }

    for a in &nodes {
        for b in &nodes {
            if a.id == b.id {
                continue;
            }
            let nested = (a.span.start_line <= b.span.start_line && a.span.end_line >= b.span.end_line)
                || (b.span.start_line <= a.span.start_line && b.span.end_line >= a.span.end_line);
            let disjoint = !a.span.overlaps_lines(&b.span);
            assert!(nested || disjoint, "{} and {} partially overlap", a.id, b.id);
        }
    }
}

#[test]
fn ids_are_sequential() {
    let nodes = nodes();
    for (i, node) in nodes.iter().enumerate() {
        assert_eq!(node.id, format!("node_{}", i + 1));
    }
}

#[test]
fn multiline_text_is_trimmed() {
    let nodes = nodes();
    let logout = nodes
        .iter()
        .find(|n| n.tag == "button")
        .expect("button indexed");
    assert_eq!(logout.text_content, "Log out");
    assert_eq!((logout.span.start_line, logout.span.end_line), (15, 17));
    assert_eq!(logout.depth, 3);
}

#[test]
fn unsupported_extension_yields_nothing() {
    assert!(index_source("README.md", NAVBAR, &IndexerConfig::default()).is_empty());
    assert!(index_source("src/util.ts", "export const x = 1;\n", &IndexerConfig::default()).is_empty());
}
