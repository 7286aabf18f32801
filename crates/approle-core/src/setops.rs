//! Set difference and intersection over slices with caller-defined equality.
//!
//! The two sides may hold different element types: a required role and an
//! assigned role are the same role when their ids match, even though only the
//! assigned one carries an assignment id. Intersection therefore yields
//! matched pairs instead of single elements.
//!
//! Order is preserved from the first slice. Both operations are quadratic,
//! which is fine for the handful of groups and roles an application has.

/// Returns every element of `a` that has no equal element in `b`.
pub fn difference<'a, T: PartialEq>(a: &'a [T], b: &[T]) -> Vec<&'a T> {
    difference_by(a, b, |x, y| x == y)
}

/// Returns every element of `a` for which `eq` holds against no element of `b`.
pub fn difference_by<'a, A, B, F>(a: &'a [A], b: &[B], eq: F) -> Vec<&'a A>
where
    F: Fn(&A, &B) -> bool,
{
    a.iter()
        .filter(|x| b.iter().all(|y| !eq(*x, y)))
        .collect()
}

/// Difference where equality means equal keys.
pub fn difference_by_key<'a, A, B, K, KA, KB>(
    a: &'a [A],
    b: &[B],
    key_a: KA,
    key_b: KB,
) -> Vec<&'a A>
where
    K: PartialEq + ?Sized,
    KA: Fn(&A) -> &K,
    KB: Fn(&B) -> &K,
{
    difference_by(a, b, |x, y| key_a(x) == key_b(y))
}

/// Returns `(x, y)` pairs of equal elements.
pub fn intersection<'a, 'b, T: PartialEq>(a: &'a [T], b: &'b [T]) -> Vec<(&'a T, &'b T)> {
    intersection_by(a, b, |x, y| x == y)
}

/// Pairs each element of `a` with the first element of `b` for which `eq`
/// holds. Elements of `a` without a match are skipped.
pub fn intersection_by<'a, 'b, A, B, F>(a: &'a [A], b: &'b [B], eq: F) -> Vec<(&'a A, &'b B)>
where
    F: Fn(&A, &B) -> bool,
{
    a.iter()
        .filter_map(|x| b.iter().find(|y| eq(x, *y)).map(|y| (x, y)))
        .collect()
}

/// Intersection where equality means equal keys.
pub fn intersection_by_key<'a, 'b, A, B, K, KA, KB>(
    a: &'a [A],
    b: &'b [B],
    key_a: KA,
    key_b: KB,
) -> Vec<(&'a A, &'b B)>
where
    K: PartialEq + ?Sized,
    KA: Fn(&A) -> &K,
    KB: Fn(&B) -> &K,
{
    intersection_by(a, b, |x, y| key_a(x) == key_b(y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Item {
        id: u32,
        label: &'static str,
    }

    fn item(id: u32, label: &'static str) -> Item {
        Item { id, label }
    }

    #[test]
    fn test_difference_default_equality() {
        let a = [1, 2, 3, 4];
        let b = [2, 4, 6];
        assert_eq!(difference(&a, &b), vec![&1, &3]);
        assert_eq!(difference(&b, &a), vec![&6]);
    }

    #[test]
    fn test_difference_with_empty_sides() {
        let empty: [u32; 0] = [];
        assert_eq!(difference(&[1, 2], &empty), vec![&1, &2]);
        assert!(difference(&empty, &[1, 2]).is_empty());
    }

    #[test]
    fn test_difference_by_key_ignores_other_fields() {
        let a = [item(1, "one"), item(2, "two")];
        let b = [item(1, "ONE")];
        let diff = difference_by_key(&a, &b, |x| &x.id, |y| &y.id);
        assert_eq!(diff, vec![&item(2, "two")]);
    }

    #[test]
    fn test_intersection_returns_pairs_from_both_sides() {
        let a = [item(1, "left"), item(2, "left"), item(3, "left")];
        let b = [item(3, "right"), item(1, "right")];
        let pairs = intersection_by_key(&a, &b, |x| &x.id, |y| &y.id);

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0.label, "left");
        assert_eq!(pairs[0].1.label, "right");
        assert_eq!(pairs[0].0.id, 1);
        assert_eq!(pairs[1].0.id, 3);
    }

    #[test]
    fn test_intersection_takes_first_match_only() {
        let a = [item(1, "a")];
        let b = [item(1, "first"), item(1, "second")];
        let pairs = intersection_by(&a, &b, |x, y| x.id == y.id);
        assert_eq!(pairs, vec![(&a[0], &b[0])]);
    }

    #[test]
    fn test_intersection_heterogeneous_types() {
        let ids = ["x", "y"];
        let records = [("y", 10), ("z", 20)];
        let pairs = intersection_by(&ids, &records, |id, rec| *id == rec.0);
        assert_eq!(pairs, vec![(&"y", &("y", 10))]);
    }

    #[test]
    fn test_intersection_default_equality() {
        let pairs = intersection(&["a", "b"], &["b", "c"]);
        assert_eq!(pairs, vec![(&"b", &"b")]);
    }
}
