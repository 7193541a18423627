fn main() -> anyhow::Result<()> {
    orderbell_lib::run()
}
