use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 一行表格数据：列名 → 标量值
pub type Row = Map<String, Value>;

/// 输入行
///
/// 从数据源读出后不可变，`index` 是它在原始数据中的位置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub index: usize,
    pub fields: Row,
}

impl Item {
    pub fn new(index: usize, fields: Row) -> Self {
        Self { index, fields }
    }

    /// 按原始顺序给每一行编号
    pub fn from_rows(rows: Vec<Row>) -> Vec<Item> {
        rows.into_iter()
            .enumerate()
            .map(|(index, fields)| Item::new(index, fields))
            .collect()
    }

    /// 大小写不敏感地查找列
    pub fn get_ignore_case(&self, key: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// 用于日志显示的 Part 值
    pub fn part_label(&self) -> String {
        match self.get_ignore_case("part") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "-".to_string(),
            Some(other) => other.to_string(),
        }
    }
}

/// 结果行的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordOrigin {
    /// 由远程服务返回
    Remote,
    /// 原样保留的输入行
    PassThrough,
}

/// 输出行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// 产生这条记录的输入行位置
    pub source_index: usize,
    pub origin: RecordOrigin,
    pub row: Row,
}

impl OutputRecord {
    pub fn remote(source_index: usize, row: Row) -> Self {
        Self {
            source_index,
            origin: RecordOrigin::Remote,
            row,
        }
    }

    pub fn pass_through(item: &Item) -> Self {
        Self {
            source_index: item.index,
            origin: RecordOrigin::PassThrough,
            row: item.fields.clone(),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.origin == RecordOrigin::Remote
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_from_rows_keeps_order() {
        let items = Item::from_rows(vec![row(json!({"part": "A"})), row(json!({"part": "B"}))]);
        assert_eq!(items[0].index, 0);
        assert_eq!(items[1].index, 1);
        assert_eq!(items[1].part_label(), "B");
    }

    #[test]
    fn test_get_ignore_case() {
        let item = Item::new(0, row(json!({"PART": 42, "qty": 3})));
        assert_eq!(item.get_ignore_case("Part"), Some(&json!(42)));
        assert_eq!(item.part_label(), "42");
        assert!(item.get_ignore_case("name").is_none());
    }

    #[test]
    fn test_pass_through_copies_fields() {
        let item = Item::new(7, row(json!({"part": "X"})));
        let record = OutputRecord::pass_through(&item);
        assert_eq!(record.source_index, 7);
        assert!(!record.is_remote());
        assert_eq!(record.row, item.fields);
    }
}
