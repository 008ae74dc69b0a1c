use crate::domain::model::{InputRecord, Transformed};

const HIGH_BALANCE_THRESHOLD: i64 = 150;
const HIGH_BALANCE_QUOTA: i64 = 25;
const BASE_QUOTA: i64 = 5;
const BONUS_ID_LIMIT: i64 = 100;
const BONUS_AMOUNT: i64 = 10;

/// 整數除法，向零截斷（-3 / 2 == -1）
pub fn average_balance(balance: i64, previous_balance: i64) -> i64 {
    // i128 下相加不會溢位，除以 2 後必定落回 i64 範圍
    ((balance as i128 + previous_balance as i128) / 2) as i64
}

pub fn free_transfer_quota(balance: i64, free_transfer: i64) -> i64 {
    if balance > HIGH_BALANCE_THRESHOLD {
        free_transfer.saturating_add(HIGH_BALANCE_QUOTA)
    } else {
        free_transfer.saturating_add(BASE_QUOTA)
    }
}

pub fn adjusted_balance(id: i64, balance: i64) -> i64 {
    if id <= BONUS_ID_LIMIT {
        balance.saturating_add(BONUS_AMOUNT)
    } else {
        balance
    }
}

pub fn transform(record: &InputRecord) -> Transformed {
    Transformed {
        average_balance: average_balance(record.balance, record.previous_balance),
        free_transfer_quota: free_transfer_quota(record.balance, record.free_transfer),
        adjusted_balance: adjusted_balance(record.id, record.balance),
    }
}
