// Integration tests for sparkify2parquet-core
//
// Decodes raw JSON lines and checks the shape of every derived table.

use arrow::array::{Array, Int32Array, Int64Array, StringArray, TimestampMicrosecondArray};
use arrow::record_batch::RecordBatch;
use sparkify2parquet_core::{
    artists_table, parse_activity_records, parse_catalog_records, song_play_events,
    songplays_table, songs_table, time_table, users_table, ArtistDedup, CalendarZone,
    InvalidTimestampPolicy, MonotonicIdGenerator,
};

const CATALOG: &str = r#"{"num_songs": 1, "artist_id": "ARDP1", "artist_latitude": 48.85, "artist_longitude": 2.35, "artist_location": "Paris", "artist_name": "Daft Punk", "song_id": "SODP1", "title": "Harder Better Faster Stronger", "duration": 224.0, "year": 2001}
{"num_songs": 1, "artist_id": "ARCS1", "artist_latitude": null, "artist_longitude": null, "artist_location": "", "artist_name": "Casual", "song_id": "SOCS1", "title": "I Didn't Mean To", "duration": 218.93179, "year": 0}
"#;

const LOG: &str = r#"{"artist":"Daft Punk","auth":"Logged In","firstName":"Lily","gender":"F","itemInSession":0,"lastName":"Koch","length":224.0,"level":"paid","location":"Chicago-Naperville-Elgin, IL-IN-WI","method":"PUT","page":"NextSong","registration":1541048010796.0,"sessionId":818,"song":"Harder Better Faster Stronger","status":200,"ts":1541990258796,"userAgent":"Mozilla/5.0","userId":"15"}
{"artist":null,"auth":"Logged In","firstName":"Lily","gender":"F","itemInSession":1,"lastName":"Koch","length":null,"level":"paid","location":"Chicago-Naperville-Elgin, IL-IN-WI","method":"GET","page":"Home","registration":1541048010796.0,"sessionId":818,"song":null,"status":200,"ts":1541990300000,"userAgent":"Mozilla/5.0","userId":"15"}
{"artist":"Unknown Band","auth":"Logged In","firstName":"Kevin","gender":"M","itemInSession":0,"lastName":"Arellano","length":180.0,"level":"free","location":"Harrisburg-Carlisle, PA","method":"PUT","page":"NextSong","registration":1540006905796.0,"sessionId":514,"song":"Nope","status":200,"ts":1541990400000,"userAgent":"Mozilla/5.0","userId":"66"}
{"artist":null,"auth":"Logged Out","firstName":null,"gender":null,"itemInSession":2,"lastName":null,"length":null,"level":"free","location":null,"method":"GET","page":"Home","registration":null,"sessionId":900,"song":null,"status":200,"ts":1541990500000,"userAgent":null,"userId":""}
"#;

fn strings(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
    let col = batch
        .column_by_name(name)
        .expect("column exists")
        .as_any()
        .downcast_ref::<StringArray>()
        .expect("utf8 column");
    (0..col.len())
        .map(|i| (!col.is_null(i)).then(|| col.value(i).to_string()))
        .collect()
}

#[test]
fn test_catalog_dimensions_are_projections() {
    let catalog = parse_catalog_records("song_data/A/B/C/songs.json", CATALOG.as_bytes()).unwrap();

    let songs = songs_table(&catalog).unwrap();
    assert_eq!(songs.num_rows(), 2);
    assert_eq!(
        strings(&songs, "song_id"),
        vec![Some("SODP1".to_string()), Some("SOCS1".to_string())]
    );
    let year = songs
        .column_by_name("year")
        .unwrap()
        .as_any()
        .downcast_ref::<Int32Array>()
        .unwrap();
    assert_eq!(year.value(1), 0);

    let artists = artists_table(&catalog, ArtistDedup::None).unwrap();
    assert_eq!(artists.num_rows(), 2);
    assert_eq!(
        strings(&artists, "artist_location"),
        vec![Some("Paris".to_string()), Some(String::new())]
    );
}

#[test]
fn test_activity_tables_end_to_end() {
    let catalog = parse_catalog_records("song_data/A/B/C/songs.json", CATALOG.as_bytes()).unwrap();
    let log = parse_activity_records("log_data/2018-11-12-events.json", LOG.as_bytes()).unwrap();
    assert_eq!(log.len(), 4);

    // Users see every page, including logged-out traffic
    let users = users_table(&log).unwrap();
    assert_eq!(users.num_rows(), 3);
    assert!(strings(&users, "user_id").contains(&Some(String::new())));

    let plays = song_play_events(&log, CalendarZone::utc(), InvalidTimestampPolicy::Fail).unwrap();
    assert_eq!(plays.events.len(), 2);

    let time = time_table(&plays.events).unwrap();
    assert_eq!(time.num_rows(), 2);
    let start = time
        .column_by_name("start_time")
        .unwrap()
        .as_any()
        .downcast_ref::<TimestampMicrosecondArray>()
        .unwrap();
    // The Home event at ...300000 never reaches the time dimension
    assert_eq!(start.value(0), 1_541_990_258_000_000);
    assert_eq!(start.value(1), 1_541_990_400_000_000);

    let songplays = songplays_table(&plays.events, &catalog, &MonotonicIdGenerator::default()).unwrap();
    assert_eq!(songplays.num_rows(), 1);
    assert_eq!(strings(&songplays, "song_id"), vec![Some("SODP1".to_string())]);
    assert_eq!(strings(&songplays, "artist_id"), vec![Some("ARDP1".to_string())]);
    let session = songplays
        .column_by_name("session_id")
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert_eq!(session.value(0), 818);
    let day_parts = songplays
        .column_by_name("month")
        .unwrap()
        .as_any()
        .downcast_ref::<Int32Array>()
        .unwrap();
    assert_eq!(day_parts.value(0), 11);
}
