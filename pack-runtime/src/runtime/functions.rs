//! # 内置函数与谓词
//!
//! 参数已经按从左到右的顺序求值完毕，这里只做分派。
//! 解析期已检查参数个数；手工构造的 AST 在这里再检查一次。

use std::collections::HashSet;

use crate::color::{ColorLookup, ColorTag};
use crate::error::EvalError;
use crate::pool::RarityPool;
use crate::script::registry::{Arity, FunctionKind, PropositionKind};
use crate::value::Value;

/// 调用内置函数
pub fn call_function(
    kind: FunctionKind,
    args: Vec<Value>,
    pool: &RarityPool,
    colors: &mut dyn ColorLookup,
) -> Result<Value, EvalError> {
    check_count(kind.name(), kind.arity(), args.len())?;
    let name = kind.name();

    match kind {
        FunctionKind::Rotate => {
            let [list, n] = exact(args, name)?;
            let n = n.as_int(name)?;
            Ok(Value::List(rotate(list.into_sequence(name)?, n)))
        }
        FunctionKind::Following => {
            let [list, item] = exact(args, name)?;
            following(list.as_sequence(name)?, &item)
        }
        FunctionKind::Zip => {
            let lists = args
                .into_iter()
                .map(|arg| arg.into_sequence(name))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(zip(lists)))
        }
        FunctionKind::Concat => {
            let [a, b] = exact(args, name)?;
            let mut items = a.into_sequence(name)?;
            items.extend(b.into_sequence(name)?);
            Ok(Value::List(items))
        }
        FunctionKind::Intersect => {
            let [a, b] = exact(args, name)?;
            Ok(Value::List(intersect(
                a.into_sequence(name)?,
                b.as_sequence(name)?,
            )))
        }
        FunctionKind::GetColors => {
            let [card] = exact(args, name)?;
            let tags = colors.lookup(card.as_card(name)?)?;
            // BTreeSet 按 WUBRG 顺序
            Ok(Value::strings(
                tags.into_iter()
                    .filter(|tag| *tag != ColorTag::Colorless)
                    .map(ColorTag::name),
            ))
        }
        FunctionKind::GetList => {
            let [key] = exact(args, name)?;
            Ok(Value::cards(pool.file_available(key.as_str(name)?)))
        }
    }
}

/// 调用内置谓词
pub fn call_proposition(kind: PropositionKind, args: Vec<Value>) -> Result<bool, EvalError> {
    check_count(kind.name(), kind.arity(), args.len())?;
    let name = kind.name();

    match kind {
        PropositionKind::Intersects => {
            let [a, b] = exact(args, name)?;
            let b = b.as_sequence(name)?;
            Ok(a.as_sequence(name)?.iter().any(|x| b.contains(x)))
        }
        PropositionKind::Subset => {
            let [a, b] = exact(args, name)?;
            let b = b.as_sequence(name)?;
            Ok(a.as_sequence(name)?.iter().all(|x| b.contains(x)))
        }
        PropositionKind::ContainsAtLeast => {
            let [list, n] = exact(args, name)?;
            let len = list.as_sequence(name)?.len();
            Ok(len as i64 >= n.as_int(name)?)
        }
        PropositionKind::ContainsExact => {
            let [list, n] = exact(args, name)?;
            let len = list.as_sequence(name)?.len();
            Ok(len as i64 == n.as_int(name)?)
        }
        PropositionKind::Contains => {
            let mut args = args.into_iter();
            let Some(list) = args.next() else {
                return Ok(true);
            };
            let list = list.as_sequence(name)?;
            Ok(args.all(|item| list.contains(&item)))
        }
        PropositionKind::And => {
            for arg in &args {
                if !arg.as_bool(name)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        PropositionKind::Or => {
            for arg in &args {
                if arg.as_bool(name)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        PropositionKind::Not => {
            let [p] = exact(args, name)?;
            Ok(!p.as_bool(name)?)
        }
        PropositionKind::Id => {
            let [p] = exact(args, name)?;
            p.as_bool(name)
        }
    }
}

/// 循环右移 `n` 位（负数左移）
pub fn rotate(mut items: Vec<Value>, n: i64) -> Vec<Value> {
    if items.is_empty() {
        return items;
    }
    let shift = n.rem_euclid(items.len() as i64) as usize;
    items.rotate_right(shift);
    items
}

/// `item` 第一次出现之后的元素，末尾回绕到开头
pub fn following(items: &[Value], item: &Value) -> Result<Value, EvalError> {
    let position = items
        .iter()
        .position(|x| x == item)
        .ok_or_else(|| EvalError::Lookup {
            message: format!("Following: 列表中没有 {}", item),
        })?;
    Ok(items[(position + 1) % items.len()].clone())
}

/// 按最短列表逐元素组成元组
pub fn zip(lists: Vec<Vec<Value>>) -> Vec<Value> {
    let shortest = lists.iter().map(Vec::len).min().unwrap_or(0);
    let mut iters: Vec<_> = lists.into_iter().map(Vec::into_iter).collect();
    (0..shortest)
        .map(|_| Value::Tuple(iters.iter_mut().filter_map(|it| it.next()).collect()))
        .collect()
}

/// 去重交集，保持第一个列表的顺序
pub fn intersect(a: Vec<Value>, b: &[Value]) -> Vec<Value> {
    let mut seen = HashSet::new();
    a.into_iter()
        .filter(|x| b.contains(x) && seen.insert(x.clone()))
        .collect()
}

fn check_count(name: &'static str, arity: Arity, found: usize) -> Result<(), EvalError> {
    if arity.accepts(found) {
        Ok(())
    } else {
        Err(EvalError::ArgumentCount {
            name,
            expected: arity.to_string(),
            found,
        })
    }
}

fn exact<const N: usize>(args: Vec<Value>, name: &'static str) -> Result<[Value; N], EvalError> {
    let found = args.len();
    args.try_into().map_err(|_| EvalError::ArgumentCount {
        name,
        expected: N.to_string(),
        found,
    })
}
