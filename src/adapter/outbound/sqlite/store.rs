//! SQLite implementation of the market and analysis store ports.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};

use crate::adapter::outbound::sqlite::database::connection::DbPool;
use crate::adapter::outbound::sqlite::database::model::{
    decode_time, encode_time, AnalysisRow, CandleRow, NewAnalysisRow, NewCandleRow, NewPriceRow,
    NewSnapshotRow, PriceRow, SnapshotRow,
};
use crate::adapter::outbound::sqlite::database::schema::{
    analyses, candles, indicator_snapshots, price_ticks,
};
use crate::domain::{
    AnalysisRecord, Candle, NewAnalysis, PriceTick, Symbol, Timeframe, Verification,
};
use crate::error::{Error, Result};
use crate::port::{AnalysisStore, MarketStore, StoredSnapshot};

type Conn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// SQLite-backed store for candles, ticks, snapshots and analyses.
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<Conn> {
        Ok(self.pool.get()?)
    }
}

fn limit_of(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

impl MarketStore for SqliteStore {
    fn insert_candles(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        batch: &[Candle],
    ) -> Result<usize> {
        let rows: Vec<NewCandleRow> = batch
            .iter()
            .map(|c| NewCandleRow::new(symbol, timeframe, c))
            .collect();
        let mut conn = self.conn()?;

        let written = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let mut written = 0;
            for row in &rows {
                written += diesel::replace_into(candles::table)
                    .values(row)
                    .execute(conn)?;
            }
            Ok(written)
        })?;
        Ok(written)
    }

    fn latest_candles(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let mut conn = self.conn()?;
        let rows: Vec<CandleRow> = candles::table
            .filter(candles::symbol.eq(symbol.as_str()))
            .filter(candles::timeframe.eq(timeframe.as_str()))
            .order(candles::timestamp.desc())
            .limit(limit_of(limit))
            .select(CandleRow::as_select())
            .load(&mut conn)?;

        rows.into_iter()
            .rev()
            .map(Candle::try_from)
            .collect()
    }

    fn last_candle_time(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
    ) -> Result<Option<DateTime<Utc>>> {
        let mut conn = self.conn()?;
        let last: Option<String> = candles::table
            .filter(candles::symbol.eq(symbol.as_str()))
            .filter(candles::timeframe.eq(timeframe.as_str()))
            .select(diesel::dsl::max(candles::timestamp))
            .first(&mut conn)?;
        last.as_deref().map(decode_time).transpose()
    }

    fn insert_price(&self, tick: &PriceTick) -> Result<()> {
        let mut conn = self.conn()?;
        diesel::insert_into(price_ticks::table)
            .values(NewPriceRow::from(tick))
            .execute(&mut conn)?;
        Ok(())
    }

    fn latest_price(&self, symbol: &Symbol) -> Result<Option<PriceTick>> {
        let mut conn = self.conn()?;
        let row: Option<PriceRow> = price_ticks::table
            .filter(price_ticks::symbol.eq(symbol.as_str()))
            .order((price_ticks::timestamp.desc(), price_ticks::id.desc()))
            .select(PriceRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(PriceTick::try_from).transpose()
    }

    fn save_snapshot(&self, snapshot: &StoredSnapshot) -> Result<()> {
        let mut conn = self.conn()?;
        diesel::replace_into(indicator_snapshots::table)
            .values(NewSnapshotRow::from(snapshot))
            .execute(&mut conn)?;
        Ok(())
    }

    fn latest_snapshot(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
    ) -> Result<Option<StoredSnapshot>> {
        let mut conn = self.conn()?;
        let row: Option<SnapshotRow> = indicator_snapshots::table
            .filter(indicator_snapshots::symbol.eq(symbol.as_str()))
            .filter(indicator_snapshots::timeframe.eq(timeframe.as_str()))
            .order(indicator_snapshots::timestamp.desc())
            .select(SnapshotRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(StoredSnapshot::try_from).transpose()
    }

    fn symbols(&self) -> Result<Vec<Symbol>> {
        let mut conn = self.conn()?;
        let raw: Vec<String> = candles::table
            .select(candles::symbol)
            .distinct()
            .order(candles::symbol.asc())
            .load(&mut conn)?;
        raw.iter()
            .map(|s| Symbol::normalize(s).map_err(|e| Error::Parse(e.to_string())))
            .collect()
    }

    fn ping(&self) -> Result<()> {
        let mut conn = self.conn()?;
        diesel::sql_query("SELECT 1").execute(&mut conn)?;
        Ok(())
    }
}

impl AnalysisStore for SqliteStore {
    fn record(&self, analysis: &NewAnalysis, created_at: DateTime<Utc>) -> Result<AnalysisRecord> {
        let row = NewAnalysisRow::new(analysis, created_at);
        let mut conn = self.conn()?;

        let stored = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::insert_into(analyses::table)
                .values(&row)
                .execute(conn)?;
            analyses::table
                .order(analyses::id.desc())
                .select(AnalysisRow::as_select())
                .first(conn)
        })?;
        AnalysisRecord::try_from(stored)
    }

    fn history(&self, symbol: Option<&Symbol>, limit: usize) -> Result<Vec<AnalysisRecord>> {
        let mut conn = self.conn()?;
        let mut query = analyses::table
            .select(AnalysisRow::as_select())
            .order((analyses::created_at.desc(), analyses::id.desc()))
            .limit(limit_of(limit))
            .into_boxed();
        if let Some(symbol) = symbol {
            query = query.filter(analyses::symbol.eq(symbol.as_str()));
        }
        let rows: Vec<AnalysisRow> = query.load(&mut conn)?;
        rows.into_iter().map(AnalysisRecord::try_from).collect()
    }

    fn pending(&self, cutoff: DateTime<Utc>) -> Result<Vec<AnalysisRecord>> {
        let mut conn = self.conn()?;
        let rows: Vec<AnalysisRow> = analyses::table
            .filter(analyses::outcome.is_null())
            .filter(analyses::created_at.le(encode_time(cutoff)))
            .order((analyses::created_at.asc(), analyses::id.asc()))
            .select(AnalysisRow::as_select())
            .load(&mut conn)?;
        rows.into_iter().map(AnalysisRecord::try_from).collect()
    }

    fn record_verification(&self, id: i64, verification: &Verification) -> Result<()> {
        let mut conn = self.conn()?;
        let updated = diesel::update(analyses::table.find(id))
            .set((
                analyses::outcome.eq(Some(verification.outcome.as_str())),
                analyses::verified_price.eq(Some(verification.price)),
                analyses::change_pct.eq(Some(verification.change_pct)),
                analyses::verified_at.eq(Some(encode_time(verification.verified_at))),
            ))
            .execute(&mut conn)?;
        if updated == 0 {
            return Err(Error::NotFound(format!("analysis {id}")));
        }
        Ok(())
    }
}
