mod status_records;
