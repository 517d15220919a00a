mod backfill;
