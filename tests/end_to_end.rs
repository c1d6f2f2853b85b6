use mockito::{Matcher, Server};
use octopus_consumption::app::pipeline::{FetchPlan, output_path, run_fetch};
use octopus_consumption::config::Credentials;
use octopus_consumption::data::OctopusClient;
use octopus_consumption::domain::{DateRange, FuelType};
use octopus_consumption::error::ErrorKind;
use serde_json::json;

const ELEC_PATH: &str = "^/v1/electricity-meter-points/123/meters/E1/consumption/";
const GAS_PATH: &str = "^/v1/gas-meter-points/456/meters/G1/consumption/";

fn credentials() -> Credentials {
    Credentials {
        mpan: "123".to_string(),
        mprn: "456".to_string(),
        electricity_serial_no: "E1".to_string(),
        gas_serial_no: "G1".to_string(),
        api_key: "k".to_string(),
        customer_id: "c".to_string(),
    }
}

fn mock_day(server: &mut Server, path: &str, from: &str, to: &str, status: usize) -> mockito::Mock {
    let body = json!({
        "count": 1,
        "next": null,
        "previous": null,
        "results": [{
            "consumption": 0.42,
            "interval_start": format!("{from}T00:00:00Z"),
            "interval_end": format!("{from}T00:30:00Z"),
        }]
    });
    server
        .mock("GET", Matcher::Regex(path.to_string()))
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("period_from".into(), from.into()),
            Matcher::UrlEncoded("period_to".into(), to.into()),
        ]))
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .expect(1)
        .create()
}

#[test]
fn electricity_range_is_written_with_one_row_per_reading() {
    let mut server = Server::new();
    let day1 = mock_day(&mut server, ELEC_PATH, "2020-01-01", "2020-01-02", 200);
    let day2 = mock_day(&mut server, ELEC_PATH, "2020-01-02", "2020-01-03", 200);

    let out = tempfile::tempdir().unwrap();
    let client = OctopusClient::new(credentials()).unwrap().with_base_url(server.url());
    let plan = FetchPlan {
        fuels: vec![FuelType::Electricity],
        range: DateRange::parse("2020-01-01", "2020-01-02").unwrap(),
        out_dir: out.path().to_path_buf(),
        strict: false,
    };

    let summaries = run_fetch(&client, &plan).unwrap();
    day1.assert();
    day2.assert();

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].record_count, 2);
    assert!(summaries[0].failed_days.is_empty());

    let path = output_path(out.path(), FuelType::Electricity, &plan.range);
    assert_eq!(summaries[0].path, path);

    let mut rdr = csv::Reader::from_path(&path).unwrap();
    assert_eq!(
        rdr.headers().unwrap().iter().collect::<Vec<_>>(),
        vec!["date", "mpan", "serial_number", "customer_id", "fuel_type", "consumption", "request_time"]
    );
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(&row[1], "123");
        assert_eq!(&row[2], "E1");
        assert_eq!(&row[3], "c");
        assert_eq!(&row[4], "electricity");
        assert_eq!(&row[5], "0.42");
        assert!(chrono::NaiveDateTime::parse_from_str(&row[6], "%Y-%m-%d %H:%M:%S").is_ok());
    }
    assert_eq!(&rows[0][0], "2020-01-01T00:00:00Z");
    assert_eq!(&rows[1][0], "2020-01-02T00:00:00Z");
}

#[test]
fn all_fuels_write_separate_files() {
    let mut server = Server::new();
    let elec = mock_day(&mut server, ELEC_PATH, "2021-06-01", "2021-06-02", 200);
    let gas = mock_day(&mut server, GAS_PATH, "2021-06-01", "2021-06-02", 200);

    let out = tempfile::tempdir().unwrap();
    let client = OctopusClient::new(credentials()).unwrap().with_base_url(server.url());
    let plan = FetchPlan {
        fuels: FuelType::ALL.to_vec(),
        range: DateRange::parse("2021-06-01", "2021-06-01").unwrap(),
        out_dir: out.path().join("nested"),
        strict: false,
    };

    let summaries = run_fetch(&client, &plan).unwrap();
    elec.assert();
    gas.assert();

    let fuels: Vec<_> = summaries.iter().map(|s| s.fuel_type).collect();
    assert_eq!(fuels, vec![FuelType::Electricity, FuelType::Gas]);

    let gas_csv = std::fs::read_to_string(&summaries[1].path).unwrap();
    let row = gas_csv.lines().nth(1).unwrap();
    assert!(row.starts_with("2021-06-01T00:00:00Z,456,G1,c,gas,0.42,"), "{row}");
}

#[test]
fn failed_day_is_tolerated_unless_strict() {
    let out = tempfile::tempdir().unwrap();
    let range = DateRange::parse("2020-01-01", "2020-01-02").unwrap();

    for strict in [false, true] {
        let mut server = Server::new();
        let _ok = mock_day(&mut server, ELEC_PATH, "2020-01-01", "2020-01-02", 200);
        let _bad = mock_day(&mut server, ELEC_PATH, "2020-01-02", "2020-01-03", 500);

        let client = OctopusClient::new(credentials()).unwrap().with_base_url(server.url());
        let plan = FetchPlan {
            fuels: vec![FuelType::Electricity],
            range,
            out_dir: out.path().to_path_buf(),
            strict,
        };

        let result = run_fetch(&client, &plan);
        let path = output_path(out.path(), FuelType::Electricity, &range);
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 2, "header plus the one good day");

        if strict {
            let err = result.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::RemoteFailure);
            assert!(err.to_string().contains("2020-01-02"), "{err}");
        } else {
            let summaries = result.unwrap();
            assert_eq!(summaries[0].record_count, 1);
            assert_eq!(summaries[0].failed_days.len(), 1);
        }
    }
}

#[test]
fn strict_run_writes_every_fuel_before_failing() {
    let mut server = Server::new();
    let _elec = mock_day(&mut server, ELEC_PATH, "2022-03-01", "2022-03-02", 503);
    let gas = mock_day(&mut server, GAS_PATH, "2022-03-01", "2022-03-02", 200);

    let out = tempfile::tempdir().unwrap();
    let range = DateRange::parse("2022-03-01", "2022-03-01").unwrap();
    let client = OctopusClient::new(credentials()).unwrap().with_base_url(server.url());
    let plan = FetchPlan {
        fuels: FuelType::ALL.to_vec(),
        range,
        out_dir: out.path().to_path_buf(),
        strict: true,
    };

    let err = run_fetch(&client, &plan).unwrap_err();
    gas.assert();
    assert_eq!(err.kind(), ErrorKind::RemoteFailure);
    assert!(err.to_string().contains("electricity (2022-03-01)"), "{err}");
    assert!(!err.to_string().contains("gas"), "{err}");

    let elec_csv = std::fs::read_to_string(output_path(out.path(), FuelType::Electricity, &range)).unwrap();
    assert_eq!(elec_csv.lines().count(), 1, "header only");
    let gas_csv = std::fs::read_to_string(output_path(out.path(), FuelType::Gas, &range)).unwrap();
    assert_eq!(gas_csv.lines().count(), 2);
}
