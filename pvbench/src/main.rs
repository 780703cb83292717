fn main() -> anyhow::Result<()> {
    pvbench::run()
}
