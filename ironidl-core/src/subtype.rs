//! Structural subtyping.
//!
//! `actual <: expected` holds when data declared as `actual` may be read as
//! `expected`. The two types usually live in different tables (the wire
//! table and the caller's table), so every check carries both.
//!
//! Recursive types are compared coinductively: a pair of table entries that
//! is already being compared is assumed to be related.

use std::collections::HashSet;

use crate::error::{FieldPath, SubtypeError};
use crate::types::{Field, FuncType, Type, TypeTable};

/// Checks `actual <: expected`.
///
/// # Errors
/// Returns [`SubtypeError`] naming the field path of the first mismatch.
pub fn is_subtype(
    actual_table: &TypeTable,
    actual: &Type,
    expected_table: &TypeTable,
    expected: &Type,
) -> Result<(), SubtypeError> {
    SubtypeChecker::new(actual_table, expected_table).check(actual, expected, false)
}

/// Checks an argument list `actual <: expected` positionally.
///
/// Expected positions beyond the actual arity must be defaultable; extra
/// actual positions are ignored.
///
/// # Errors
/// Returns [`SubtypeError`] naming the argument and field path.
pub fn check_args(
    actual_table: &TypeTable,
    actual: &[Type],
    expected_table: &TypeTable,
    expected: &[Type],
) -> Result<(), SubtypeError> {
    SubtypeChecker::new(actual_table, expected_table).check_list(actual, expected, false)
}

/// Subtype checker over a pair of tables.
#[derive(Debug)]
pub(crate) struct SubtypeChecker<'a> {
    actual: &'a TypeTable,
    expected: &'a TypeTable,
    assumed: HashSet<(usize, usize, bool)>,
    path: FieldPath,
}

impl<'a> SubtypeChecker<'a> {
    pub(crate) fn new(actual: &'a TypeTable, expected: &'a TypeTable) -> Self {
        Self {
            actual,
            expected,
            assumed: HashSet::new(),
            path: FieldPath::new(),
        }
    }

    /// Checks one top-level argument, reporting paths under `arg{index}`.
    pub(crate) fn check_arg(
        &mut self,
        index: usize,
        actual: &Type,
        expected: &Type,
    ) -> Result<(), SubtypeError> {
        self.path.push(format!("arg{index}"));
        let result = self.check(actual, expected, false);
        self.path.pop();
        result
    }

    /// Tables holding `(sub, sup)`; flipped under contravariance.
    const fn tables(&self, flipped: bool) -> (&'a TypeTable, &'a TypeTable) {
        if flipped {
            (self.expected, self.actual)
        } else {
            (self.actual, self.expected)
        }
    }

    fn fail(&self, reason: impl Into<String>) -> SubtypeError {
        SubtypeError::new(&self.path, reason)
    }

    fn check(&mut self, sub: &Type, sup: &Type, flipped: bool) -> Result<(), SubtypeError> {
        let (sub_table, sup_table) = self.tables(flipped);
        let (sub_index, sub) = sub_table
            .resolve_indexed(sub)
            .map_err(|e| self.fail(e.to_string()))?;
        let (sup_index, sup) = sup_table
            .resolve_indexed(sup)
            .map_err(|e| self.fail(e.to_string()))?;

        if let (Some(a), Some(b)) = (sub_index, sup_index) {
            if !self.assumed.insert((a, b, flipped)) {
                return Ok(());
            }
        }

        match (sub, sup) {
            (_, Type::Reserved) | (Type::Empty, _) => Ok(()),
            (Type::Null, Type::Opt(_)) => Ok(()),
            (Type::Opt(sub_inner), Type::Opt(sup_inner)) => {
                self.check(sub_inner, sup_inner, flipped)
            }
            (_, Type::Opt(sup_inner)) => self.check(sub, sup_inner, flipped),
            (Type::Vec(sub_inner), Type::Vec(sup_inner)) => {
                self.check(sub_inner, sup_inner, flipped)
            }
            (Type::Record(sub_fields), Type::Record(sup_fields)) => {
                self.check_record(sub_fields, sup_fields, flipped)
            }
            (Type::Variant(sub_fields), Type::Variant(sup_fields)) => {
                self.check_variant(sub_fields, sup_fields, flipped)
            }
            (Type::Func(sub_func), Type::Func(sup_func)) => {
                self.check_func(sub_func, sup_func, flipped)
            }
            (Type::Service(sub_methods), Type::Service(sup_methods)) => {
                for (name, sup_ty) in sup_methods {
                    let (_, sub_ty) = sub_methods
                        .iter()
                        .find(|(method, _)| method == name)
                        .ok_or_else(|| self.fail(format!("method '{name}' is missing")))?;
                    self.path.push(name.clone());
                    self.check(sub_ty, sup_ty, flipped)?;
                    self.path.pop();
                }
                Ok(())
            }
            (a, b) if a.is_primitive() && a.opcode() == b.opcode() => Ok(()),
            (a, b) => Err(self.fail(format!(
                "{} is not a subtype of {}",
                a.kind_name(),
                b.kind_name()
            ))),
        }
    }

    fn check_record(
        &mut self,
        sub_fields: &[Field],
        sup_fields: &[Field],
        flipped: bool,
    ) -> Result<(), SubtypeError> {
        let (_, sup_table) = self.tables(flipped);
        for sup_field in sup_fields {
            self.path.push(sup_field.label.to_string());
            match sub_fields.iter().find(|f| f.label == sup_field.label) {
                Some(sub_field) => self.check(&sub_field.ty, &sup_field.ty, flipped)?,
                None => {
                    let defaultable = sup_table
                        .is_defaultable(&sup_field.ty)
                        .map_err(|e| self.fail(e.to_string()))?;
                    if !defaultable {
                        return Err(self.fail("required field is missing"));
                    }
                }
            }
            self.path.pop();
        }
        Ok(())
    }

    fn check_variant(
        &mut self,
        sub_fields: &[Field],
        sup_fields: &[Field],
        flipped: bool,
    ) -> Result<(), SubtypeError> {
        for sub_field in sub_fields {
            self.path.push(sub_field.label.to_string());
            let sup_field = sup_fields
                .iter()
                .find(|f| f.label == sub_field.label)
                .ok_or_else(|| self.fail("variant tag is not known to the expected type"))?;
            self.check(&sub_field.ty, &sup_field.ty, flipped)?;
            self.path.pop();
        }
        Ok(())
    }

    fn check_func(
        &mut self,
        sub: &FuncType,
        sup: &FuncType,
        flipped: bool,
    ) -> Result<(), SubtypeError> {
        let mut sub_modes = sub.modes.clone();
        let mut sup_modes = sup.modes.clone();
        sub_modes.sort_unstable();
        sub_modes.dedup();
        sup_modes.sort_unstable();
        sup_modes.dedup();
        if sub_modes != sup_modes {
            return Err(self.fail("function annotations differ"));
        }
        // arguments flow the other way
        self.check_list(&sup.args, &sub.args, !flipped)?;
        self.check_list(&sub.rets, &sup.rets, flipped)
    }

    fn check_list(
        &mut self,
        subs: &[Type],
        sups: &[Type],
        flipped: bool,
    ) -> Result<(), SubtypeError> {
        let (_, sup_table) = self.tables(flipped);
        for (index, sup) in sups.iter().enumerate() {
            self.path.push(format!("arg{index}"));
            match subs.get(index) {
                Some(sub) => self.check(sub, sup, flipped)?,
                None => {
                    let defaultable = sup_table
                        .is_defaultable(sup)
                        .map_err(|e| self.fail(e.to_string()))?;
                    if !defaultable {
                        return Err(self.fail("required argument is missing"));
                    }
                }
            }
            self.path.pop();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FuncMode;

    fn sub(actual: &Type, expected: &Type) -> Result<(), SubtypeError> {
        let table = TypeTable::new();
        is_subtype(&table, actual, &table, expected)
    }

    #[test]
    fn test_primitives() {
        assert!(sub(&Type::Nat, &Type::Nat).is_ok());
        assert!(sub(&Type::Nat, &Type::Int).is_err());
        assert!(sub(&Type::Int, &Type::Nat).is_err());
        assert!(sub(&Type::Nat8, &Type::Nat16).is_err());
    }

    #[test]
    fn test_reserved_and_empty() {
        assert!(sub(&Type::Text, &Type::Reserved).is_ok());
        assert!(sub(&Type::Empty, &Type::record([("a", Type::Nat)])).is_ok());
        assert!(sub(&Type::Reserved, &Type::Text).is_err());
    }

    #[test]
    fn test_opt_rules() {
        let opt_nat = Type::opt(Type::Nat);
        assert!(sub(&Type::Null, &opt_nat).is_ok());
        assert!(sub(&Type::opt(Type::Nat), &opt_nat).is_ok());
        assert!(sub(&Type::Nat, &opt_nat).is_ok());
        assert!(sub(&Type::Text, &opt_nat).is_err());
    }

    #[test]
    fn test_record_width_and_defaults() {
        let actual = Type::record([("a", Type::Nat), ("b", Type::opt(Type::Text))]);
        let narrow = Type::record([("a", Type::Nat)]);
        assert!(sub(&actual, &narrow).is_ok());

        let wider = Type::record([("a", Type::Nat), ("c", Type::opt(Type::Nat))]);
        assert!(sub(&actual, &wider).is_ok());

        let required = Type::record([("a", Type::Nat), ("c", Type::Nat)]);
        let err = sub(&actual, &required).unwrap_err();
        assert_eq!(err.path.to_string(), "c");
    }

    #[test]
    fn test_variant_direction() {
        let actual = Type::variant([("ok", Type::Nat), ("err", Type::Text)]);
        let superset = Type::variant([
            ("ok", Type::Nat),
            ("err", Type::Text),
            ("other", Type::Null),
        ]);
        let subset = Type::variant([("ok", Type::Nat)]);
        assert!(sub(&actual, &superset).is_ok());
        let err = sub(&actual, &subset).unwrap_err();
        assert_eq!(err.path.to_string(), "err");
    }

    #[test]
    fn test_func_contravariance() {
        let narrow_arg = Type::Func(FuncType {
            modes: vec![],
            args: vec![Type::record([("a", Type::Nat)])],
            rets: vec![Type::Nat],
        });
        let wide_arg = Type::Func(FuncType {
            modes: vec![],
            args: vec![Type::record([("a", Type::Nat), ("b", Type::Nat)])],
            rets: vec![Type::Nat],
        });
        // a function accepting fewer fields can stand in for one given more
        assert!(sub(&narrow_arg, &wide_arg).is_ok());
        assert!(sub(&wide_arg, &narrow_arg).is_err());
    }

    #[test]
    fn test_func_modes_must_match() {
        let query = Type::Func(FuncType {
            modes: vec![FuncMode::Query],
            ..FuncType::default()
        });
        let update = Type::Func(FuncType::default());
        assert!(sub(&query, &update).is_err());
        assert!(sub(&query, &query.clone()).is_ok());
    }

    #[test]
    fn test_arg_list_arity() {
        let table = TypeTable::new();
        let expected = [Type::Nat, Type::opt(Type::Text)];
        assert!(check_args(&table, &[Type::Nat], &table, &expected).is_ok());
        assert!(check_args(&table, &[Type::Nat, Type::Text], &table, &[Type::Nat]).is_ok());
        let err = check_args(&table, &[], &table, &[Type::Nat]).unwrap_err();
        assert_eq!(err.path.to_string(), "arg0");
    }

    #[test]
    fn test_service_methods() {
        let method = Type::Func(FuncType {
            modes: vec![FuncMode::Query],
            args: vec![],
            rets: vec![Type::Text],
        });
        let actual = Type::Service(vec![
            ("greet".to_string(), method.clone()),
            ("other".to_string(), method.clone()),
        ]);
        let expected = Type::Service(vec![("greet".to_string(), method)]);
        assert!(sub(&actual, &expected).is_ok());
        assert!(sub(&expected, &actual).is_err());
    }

    #[test]
    fn test_recursive_types_across_tables() {
        let mut left = TypeTable::new();
        let list = left.reserve_named("List").unwrap();
        left.set(
            list,
            Type::opt(Type::record([("head", Type::Nat), ("tail", Type::Ref(list))])),
        )
        .unwrap();

        let mut right = TypeTable::new();
        let stream = right.reserve_named("Stream").unwrap();
        right
            .set(
                stream,
                Type::opt(Type::record([
                    ("head", Type::Nat),
                    ("tail", Type::Ref(stream)),
                    ("extra", Type::opt(Type::Text)),
                ])),
            )
            .unwrap();

        assert!(is_subtype(&left, &Type::Ref(list), &right, &Type::Ref(stream)).is_ok());
        assert!(is_subtype(&right, &Type::Ref(stream), &left, &Type::Ref(list)).is_ok());
    }
}
