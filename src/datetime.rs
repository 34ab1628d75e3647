use chrono::Local;
#[cfg(not(test))]
use chrono::{DateTime, Utc};

/// 経過時間の計算に使う現在時刻。
#[cfg(not(test))]
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
pub use mock_datetime::now;

/// ローカルタイムゾーンのUTCからのオフセットを分単位で取得する。
///
/// サーバーはこの値を使ってユーザーのローカルな1日の境界で集計する。
/// 東側のタイムゾーンでは正の値になる。
pub fn local_offset_minutes() -> i32 {
    Local::now().offset().local_minus_utc() / 60
}
