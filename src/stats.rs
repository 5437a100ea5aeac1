use std::collections::BTreeMap;

/// Answers recorded for one multiplication table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStat {
    pub correct: u32,
    pub total: u32,
}

impl TableStat {
    /// Accuracy rounded to the nearest whole percent
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.correct as f64 / self.total as f64) * 100.0).round() as u32
    }
}

/// One row of the end-of-session report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableAccuracy {
    pub table: u32,
    pub correct: u32,
    pub total: u32,
    pub percentage: u32,
}

/// How well a table went, used to color the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    Good,
    Fair,
    Poor,
}

impl TableAccuracy {
    pub fn grade(&self) -> Grade {
        match self.percentage {
            80.. => Grade::Good,
            50..=79 => Grade::Fair,
            _ => Grade::Poor,
        }
    }
}

/// Per-table outcome counts keyed by the question's `a` operand
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableStats {
    tables: BTreeMap<u32, TableStat>,
}

impl TableStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, table: u32, was_correct: bool) {
        let stat = self.tables.entry(table).or_default();
        stat.total += 1;
        if was_correct {
            stat.correct += 1;
        }
    }

    pub fn get(&self, table: u32) -> Option<TableStat> {
        self.tables.get(&table).copied()
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Rows sorted by table number
    pub fn report(&self) -> Vec<TableAccuracy> {
        self.tables
            .iter()
            .map(|(&table, stat)| TableAccuracy {
                table,
                correct: stat.correct,
                total: stat.total,
                percentage: stat.percentage(),
            })
            .collect()
    }
}
