//! Expressions by index.
//!
//! [`Enumerator`] is a bijection between natural numbers and boolean
//! expressions over `AND`, `OR`, `XOR` and `NOT`. Expressions are ordered by
//! the number of operators they contain; within one size class, by the number
//! of `NOT`s (most first), then by tree shape, operator choice, and finally by
//! the way their leaves are labelled.
//!
//! Leaf labelling is modulo renaming: the leaves of an expression are
//! partitioned into variables, and the first variable to appear is always `A`,
//! the next new one `B`, and so on. A tree with `s` leaves therefore has
//! `Bell(s)` labellings, each encoded as a restricted growth string.
//!
//! All counts are arbitrary precision; the expression space grows
//! super-exponentially with its size limits. The default limits (100 leaves,
//! 100 `NOT`s) give roughly `2^999` expressions, and building their tables
//! takes a noticeable while; [`Enumerator::with_limits`] builds a smaller space.
//!
//! Indices are stable across limits for every size class both spaces contain
//! in full, so the first expressions are the same in any space.

use std::collections::BTreeMap;

use log::debug;
use num_bigint::BigUint;
use serde::Deserialize;

use crate::ast::{node_id, BinaryKind, Expr, TreeDocument};
use crate::engine::ExpressionEngine;
use crate::error::EngineError;

/// Size limits of the enumerated space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnumeratorConfig {
    /// Maximal number of leaves in an expression.
    pub max_leaves: usize,
    /// Maximal number of `NOT` nodes in an expression.
    pub max_unary: usize,
}

impl Default for EnumeratorConfig {
    fn default() -> Self {
        Self {
            max_leaves: 100,
            max_unary: 100,
        }
    }
}

/// Label of the `i`-th distinct variable: `A, B, ..., Z, AA, AB, ...`.
pub fn variable_label(mut i: usize) -> String {
    let mut label = Vec::new();
    loop {
        label.push(b'A' + (i % 26) as u8);
        if i < 26 {
            break;
        }
        i = i / 26 - 1;
    }
    label.reverse();
    String::from_utf8(label).unwrap_or_default()
}

// Pre-order shape of a tree, before operators and labels are chosen.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Tag {
    Leaf,
    Unary,
    Binary,
}

/// Decomposition of an index into its independent coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Components {
    shape: Vec<Tag>,
    op_index: BigUint,
    labels: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct Enumerator {
    config: EnumeratorConfig,
    /// `pow3[b]`: operator choices for `b` binary nodes.
    pow3: Vec<BigUint>,
    /// `bell[s]`: set partitions of `s` leaves.
    bell: Vec<BigUint>,
    /// `shapes[s][u]`: tree shapes with `s` leaves and `u` unary nodes.
    shapes: Vec<Vec<BigUint>>,
    /// `rgs[len][m]`: restricted growth tails of length `len` after a prefix with maximum `m`.
    rgs: Vec<Vec<BigUint>>,
    /// `prefix[n]`: number of expressions with at most `n` operators.
    prefix: Vec<BigUint>,
}

impl Default for Enumerator {
    fn default() -> Self {
        Self::new(EnumeratorConfig::default())
    }
}

impl Enumerator {
    pub fn new(config: EnumeratorConfig) -> Self {
        let max_s = config.max_leaves.max(1);
        let max_u = config.max_unary;
        let zero = || BigUint::from(0u32);
        let one = || BigUint::from(1u32);

        let mut pow3 = vec![one(); max_s + 1];
        for i in 1..=max_s {
            pow3[i] = &pow3[i - 1] * 3u32;
        }

        // Bell triangle.
        let mut bell = vec![zero(); max_s + 1];
        bell[0] = one();
        let mut prev = vec![zero(); max_s + 1];
        prev[0] = one();
        for n in 1..=max_s {
            let mut cur = vec![zero(); max_s + 1];
            cur[0] = prev[n - 1].clone();
            for k in 1..=n {
                cur[k] = &cur[k - 1] + &prev[k - 1];
            }
            bell[n] = cur[0].clone();
            prev = cur;
        }

        // A shape is a leaf, a NOT over a shape, or a binary node over two shapes.
        let mut shapes = vec![vec![zero(); max_u + 1]; max_s + 1];
        for s in 1..=max_s {
            for u in 0..=max_u {
                let mut count = if s == 1 && u == 0 { one() } else { zero() };
                if u > 0 {
                    count += &shapes[s][u - 1];
                }
                for ls in 1..s {
                    let rs = s - ls;
                    for u1 in 0..=u {
                        count += &shapes[ls][u1] * &shapes[rs][u - u1];
                    }
                }
                shapes[s][u] = count;
            }
        }

        let mut rgs = vec![vec![zero(); max_s + 2]; max_s + 2];
        for m in 0..=max_s + 1 {
            rgs[0][m] = one();
        }
        for len in 1..=max_s {
            for m in (0..=max_s).rev() {
                let mut sum = zero();
                for v in 0..=m + 1 {
                    sum += &rgs[len - 1][m.max(v)];
                }
                rgs[len][m] = sum;
            }
        }

        let max_n = max_s - 1 + max_u;
        let mut prefix = Vec::with_capacity(max_n + 1);
        let mut total = zero();
        for n in 0..=max_n {
            for u in 0..=n.min(max_u) {
                let s = n - u + 1;
                if s > max_s {
                    continue;
                }
                total += &shapes[s][u] * &pow3[n - u] * &bell[s];
            }
            prefix.push(total.clone());
        }

        debug!("enumerator: {:?}, {} expressions", config, total);
        Self {
            config,
            pow3,
            bell,
            shapes,
            rgs,
            prefix,
        }
    }

    pub fn with_limits(max_leaves: usize, max_unary: usize) -> Self {
        Self::new(EnumeratorConfig { max_leaves, max_unary })
    }

    pub fn config(&self) -> &EnumeratorConfig {
        &self.config
    }

    /// The expression at `index`.
    pub fn expression(&self, index: &BigUint) -> Result<Expr, EngineError> {
        let components = self.components(index)?;
        Ok(build(&components))
    }

    fn components(&self, index: &BigUint) -> Result<Components, EngineError> {
        let invalid = || EngineError::InvalidIndex(index.to_string());

        // Size class: the first `n` whose prefix count exceeds the index.
        let n = self.prefix.partition_point(|p| p <= index);
        if n == self.prefix.len() {
            return Err(invalid());
        }
        let mut rem = if n == 0 { index.clone() } else { index - &self.prefix[n - 1] };

        let mut selected = None;
        for u in (0..=n.min(self.config.max_unary)).rev() {
            let s = n - u + 1;
            if s >= self.pow3.len() {
                continue;
            }
            let block = &self.shapes[s][u] * &self.pow3[n - u] * &self.bell[s];
            if rem < block {
                selected = Some((s, u, n - u));
                break;
            }
            rem -= &block;
        }
        let (s, u, b) = selected.ok_or_else(invalid)?;

        let per_shape = &self.pow3[b] * &self.bell[s];
        let shape_index = &rem / &per_shape;
        let tmp = &rem % &per_shape;
        let op_index = &tmp / &self.bell[s];
        let rgs_index = &tmp % &self.bell[s];

        let mut shape = Vec::with_capacity(s + u + b);
        self.unrank_shape(s, u, shape_index, &mut shape).ok_or_else(invalid)?;
        let labels = self.unrank_rgs(s, rgs_index).ok_or_else(invalid)?;
        Ok(Components { shape, op_index, labels })
    }

    // Appends the pre-order tags of the `k`-th shape with `s` leaves and `u` NOTs.
    fn unrank_shape(&self, s: usize, u: usize, mut k: BigUint, out: &mut Vec<Tag>) -> Option<()> {
        if s == 1 && u == 0 {
            out.push(Tag::Leaf);
            return Some(());
        }
        if u > 0 {
            let c = &self.shapes[s][u - 1];
            if &k < c {
                out.push(Tag::Unary);
                return self.unrank_shape(s, u - 1, k, out);
            }
            k -= c;
        }
        for ls in 1..s {
            let rs = s - ls;
            for u1 in 0..=u {
                let right = &self.shapes[rs][u - u1];
                let block = &self.shapes[ls][u1] * right;
                if k < block {
                    out.push(Tag::Binary);
                    self.unrank_shape(ls, u1, &k / right, out)?;
                    return self.unrank_shape(rs, u - u1, &k % right, out);
                }
                k -= &block;
            }
        }
        None
    }

    // The `k`-th restricted growth string of length `len`.
    fn unrank_rgs(&self, len: usize, mut k: BigUint) -> Option<Vec<usize>> {
        let mut labels = Vec::with_capacity(len);
        let mut cur = 0;
        for i in 0..len {
            let mut chosen = None;
            for v in 0..=cur + 1 {
                let count = &self.rgs[len - i - 1][cur.max(v)];
                if &k < count {
                    chosen = Some(v);
                    break;
                }
                k -= count;
            }
            let v = chosen?;
            if v == cur + 1 {
                cur += 1;
            }
            labels.push(v);
        }
        Some(labels)
    }
}

fn build(components: &Components) -> Expr {
    struct Cursor<'a> {
        shape: &'a [Tag],
        labels: &'a [usize],
        op_index: BigUint,
        pos: usize,
        leaf: usize,
    }

    impl Cursor<'_> {
        fn next(&mut self) -> Expr {
            let tag = self.shape[self.pos];
            self.pos += 1;
            match tag {
                Tag::Leaf => {
                    let label = variable_label(self.labels[self.leaf]);
                    self.leaf += 1;
                    Expr::Variable(label)
                }
                Tag::Unary => Expr::not(self.next()),
                Tag::Binary => {
                    let choice = (&self.op_index % 3u32).to_u32_digits().first().copied().unwrap_or(0);
                    self.op_index /= 3u32;
                    let kind = BinaryKind::ALL[choice as usize];
                    let lhs = self.next();
                    let rhs = self.next();
                    Expr::binary(kind, lhs, rhs)
                }
            }
        }
    }

    Cursor {
        shape: &components.shape,
        labels: &components.labels,
        op_index: components.op_index.clone(),
        pos: 0,
        leaf: 0,
    }
    .next()
}

impl ExpressionEngine for Enumerator {
    fn count(&self) -> BigUint {
        self.prefix.last().cloned().unwrap_or_default()
    }

    fn expression_text(&self, index: &BigUint) -> Result<String, EngineError> {
        Ok(self.expression(index)?.to_string())
    }

    fn expression_tree(&self, index: &BigUint) -> Result<TreeDocument, EngineError> {
        let tree = self.expression(index)?;
        Ok(TreeDocument {
            expr: tree.to_string(),
            tree,
        })
    }

    fn evaluate(&self, index: &BigUint, assignment: &str) -> Result<String, EngineError> {
        let tree = self.expression(index)?;
        let assignment: BTreeMap<String, bool> =
            serde_json::from_str(assignment).map_err(|e| EngineError::Decode(e.to_string()))?;

        let values = tree.eval_all(&|name: &str| assignment.get(name).copied());
        let result: BTreeMap<String, bool> = values
            .into_iter()
            .enumerate()
            .filter_map(|(i, value)| value.map(|v| (node_id(i), v)))
            .collect();
        serde_json::to_string(&result).map_err(|e| EngineError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn idx(i: u32) -> BigUint {
        BigUint::from(i)
    }

    fn small() -> Enumerator {
        Enumerator::with_limits(8, 8)
    }

    #[test]
    fn test_variable_label() {
        assert_eq!(variable_label(0), "A");
        assert_eq!(variable_label(1), "B");
        assert_eq!(variable_label(25), "Z");
        assert_eq!(variable_label(26), "AA");
        assert_eq!(variable_label(27), "AB");
        assert_eq!(variable_label(51), "AZ");
        assert_eq!(variable_label(52), "BA");
    }

    #[test]
    fn test_tables() {
        let e = small();
        let bell: Vec<u32> = [1, 1, 2, 5, 15, 52, 203].to_vec();
        for (n, &b) in bell.iter().enumerate() {
            assert_eq!(e.bell[n], idx(b), "Bell({})", n);
        }
        // Tails after the mandatory leading 0.
        for n in 1..bell.len() {
            assert_eq!(e.rgs[n - 1][0], e.bell[n], "rgs[{}][0]", n - 1);
        }
        assert_eq!(e.pow3[4], idx(81));
        // Full binary trees with s leaves: Catalan(s - 1).
        assert_eq!(e.shapes[1][0], idx(1));
        assert_eq!(e.shapes[3][0], idx(2));
        assert_eq!(e.shapes[4][0], idx(5));
        // NOT(B(L,L)), B(NOT L, L), B(L, NOT L)
        assert_eq!(e.shapes[2][1], idx(3));
        assert_eq!(e.shapes[1][3], idx(1));
    }

    #[test]
    fn test_small_space() {
        let e = Enumerator::new(EnumeratorConfig {
            max_leaves: 2,
            max_unary: 1,
        });
        // 1 of size 0, 7 of size 1, 18 of size 2.
        assert_eq!(e.count(), idx(26));

        let texts: Vec<String> = (0..26).map(|i| e.expression_text(&idx(i)).unwrap()).collect();
        let unique: HashSet<&String> = texts.iter().collect();
        assert_eq!(unique.len(), 26);
        assert!(e.expression_text(&idx(26)).is_err());
    }

    #[test]
    fn test_first_expressions() {
        let e = small();
        let expected = [
            "A",
            "NOT(A)",
            "AND(A,A)",
            "AND(A,B)",
            "OR(A,A)",
            "OR(A,B)",
            "XOR(A,A)",
            "XOR(A,B)",
            "NOT(NOT(A))",
            "NOT(AND(A,A))",
            "NOT(AND(A,B))",
        ];
        for (i, text) in expected.iter().enumerate() {
            assert_eq!(e.expression_text(&idx(i as u32)).unwrap(), *text, "index {}", i);
        }
        assert_eq!(e.expression_text(&idx(16)).unwrap(), "AND(A,NOT(B))");
    }

    #[test]
    fn test_labels_are_canonical() {
        let e = small();
        for i in 0..500 {
            let tree = e.expression(&idx(i)).unwrap();
            let vars = crate::vars::extract_variables(Some(&tree), crate::vars::VariableOrder::FirstSeen);
            let expected: Vec<String> = (0..vars.len()).map(variable_label).collect();
            assert_eq!(vars, expected, "index {}", i);
        }
    }

    #[test]
    fn test_invalid_index() {
        let e = small();
        let count = e.count();
        assert_eq!(e.expression_text(&count), Err(EngineError::InvalidIndex(count.to_string())));
        assert!(e.expression_tree(&(count + 1u32)).is_err());
    }

    #[test]
    fn test_tree_matches_text() {
        let e = small();
        let doc = e.expression_tree(&idx(16)).unwrap();
        assert_eq!(doc.expr, "AND(A,NOT(B))");
        assert_eq!(doc.tree, Expr::and(Expr::var("A"), Expr::not(Expr::var("B"))));
    }

    #[test]
    fn test_evaluate() {
        let e = small();
        let raw = e.evaluate(&idx(16), r#"{"A":true,"B":true}"#).unwrap();
        let values: BTreeMap<String, bool> = serde_json::from_str(&raw).unwrap();
        let expected: BTreeMap<String, bool> = [("n0", false), ("n1", true), ("n2", false), ("n3", true)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn test_evaluate_partial_assignment() {
        let e = small();
        let raw = e.evaluate(&idx(16), r#"{"A":true}"#).unwrap();
        assert_eq!(raw, r#"{"n1":true}"#);
    }

    #[test]
    fn test_evaluate_bad_assignment() {
        let e = small();
        assert!(matches!(e.evaluate(&idx(16), "not json"), Err(EngineError::Decode(_))));
        assert!(matches!(e.evaluate(&e.count(), "{}"), Err(EngineError::InvalidIndex(_))));
    }

    #[test]
    fn test_default_limits() {
        let config = EnumeratorConfig::default();
        assert_eq!(config.max_leaves, 100);
        assert_eq!(config.max_unary, 100);
    }

    #[test]
    fn test_larger_limits_accept_more_indices() {
        let narrow = Enumerator::with_limits(6, 6);
        let wide = Enumerator::with_limits(9, 9);
        assert!(wide.count() > narrow.count());

        let beyond = narrow.count() + 5u32;
        assert!(matches!(narrow.expression(&beyond), Err(EngineError::InvalidIndex(_))));
        assert!(wide.expression(&beyond).is_ok());

        // Size classes up to 5 operators are complete in both spaces.
        for i in 0..200 {
            assert_eq!(narrow.expression_text(&idx(i)), wide.expression_text(&idx(i)), "index {}", i);
        }
    }
}
